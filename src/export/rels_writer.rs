//! Serialization of `.rels` parts.

use crate::namespaces::NS_RELATIONSHIPS;
use crate::parser::Relationship;
use crate::xml_helpers::xml_escape;

/// A relationship list being extended with new entries.
#[derive(Debug)]
pub(crate) struct RelationshipSet {
    rels: Vec<Relationship>,
    next_id: u32,
}

impl Default for RelationshipSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RelationshipSet {
    pub fn new(rels: Vec<Relationship>) -> Self {
        let next_id = rels
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        Self { rels, next_id }
    }

    /// Add an internal relationship and return its fresh id.
    ///
    /// `next_id` is above every numeric `rIdN` already present, so fresh ids
    /// never collide.
    pub fn add(&mut self, rel_type: &str, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            target_mode: None,
        });
        id
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(128 + self.rels.len() * 160);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push('\n');
        out.push_str(&format!(r#"<Relationships xmlns="{NS_RELATIONSHIPS}">"#));
        for rel in &self.rels {
            out.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                xml_escape(&rel.id),
                xml_escape(&rel.rel_type),
                xml_escape(&rel.target)
            ));
            if let Some(mode) = &rel.target_mode {
                out.push_str(&format!(r#" TargetMode="{}""#, xml_escape(mode)));
            }
            out.push_str("/>");
        }
        out.push_str("</Relationships>");
        out
    }
}
