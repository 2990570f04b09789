//! Binding plans: where each property of a raised entity graph is read from.

use sqlentity_core::{
    AttributeSource, EntityDefinition, EntityDescriptor, EntityLocation, Error, LookupErrorKind,
    RecordReader, Result,
};
use std::collections::HashMap;

/// One property bound to a reader column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub property: &'static str,
    /// Reader column the value is read from
    pub column: String,
    /// Position of `column` in the reader, `None` when it was not projected
    pub ordinal: Option<usize>,
    /// Part of the owning entity's primary key
    pub key: bool,
}

impl FieldBinding {
    pub fn is_bound(&self) -> bool {
        self.ordinal.is_some()
    }
}

/// One entity of the graph: the root, or a nested relation.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub entity: &'static str,
    pub location: EntityLocation,
    /// Relation property on the parent, `None` for the root
    pub property: Option<&'static str>,
    pub parent: Option<usize>,
    pub fields: Vec<FieldBinding>,
    /// Relation properties and the node each one materializes into
    pub relations: Vec<(&'static str, usize)>,
}

impl PlanNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn field(&self, property: &str) -> Option<(usize, &FieldBinding)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.property == property)
    }

    pub fn relation(&self, property: &str) -> Option<usize> {
        self.relations
            .iter()
            .find(|(p, _)| *p == property)
            .map(|&(_, node)| node)
    }

    /// Bound key fields, by field index.
    pub(crate) fn bound_keys(&self) -> impl Iterator<Item = (usize, &FieldBinding)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.key && f.is_bound())
    }
}

/// How to materialize one entity shape from one reader shape.
///
/// Node 0 is the root. Every other node follows its parent, so a single
/// forward pass sees parents first.
#[derive(Debug, Clone)]
pub struct BindingPlan {
    columns: Vec<String>,
    nodes: Vec<PlanNode>,
}

impl BindingPlan {
    /// Derive the plan for `definition` over the columns `reader` exposes.
    pub fn build(definition: &EntityDefinition, reader: &dyn RecordReader) -> Result<Self> {
        let columns = reader_columns(reader);
        Self::for_columns(definition, columns)
    }

    pub(crate) fn for_columns(definition: &EntityDefinition, columns: Vec<String>) -> Result<Self> {
        let ordinals: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut builder = PlanBuilder {
            definition,
            columns: &columns,
            ordinals,
            nodes: Vec::new(),
        };
        builder.bind(
            definition.descriptor(),
            String::new(),
            None,
            None,
            definition.location().clone(),
        )?;
        let nodes = builder.nodes;

        tracing::debug!(
            entity = definition.entity_name(),
            nodes = nodes.len(),
            columns = columns.len(),
            "Built binding plan"
        );
        Ok(Self { columns, nodes })
    }

    /// Reader columns the plan was built for.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn root(&self) -> &PlanNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> Option<&PlanNode> {
        self.nodes.get(index)
    }

    /// Nodes that belong to relations, in materialization order.
    pub fn relation_nodes(&self) -> impl Iterator<Item = (usize, &PlanNode)> {
        self.nodes.iter().enumerate().skip(1)
    }
}

pub(crate) fn reader_columns(reader: &dyn RecordReader) -> Vec<String> {
    (0..reader.field_count())
        .map(|i| reader.field_name(i).unwrap_or_default().to_string())
        .collect()
}

struct PlanBuilder<'a> {
    definition: &'a EntityDefinition,
    columns: &'a [String],
    ordinals: HashMap<&'a str, usize>,
    nodes: Vec<PlanNode>,
}

impl PlanBuilder<'_> {
    fn bind(
        &mut self,
        descriptor: &'static EntityDescriptor,
        prefix: String,
        property: Option<&'static str>,
        parent: Option<usize>,
        location: EntityLocation,
    ) -> Result<usize> {
        let index = self.nodes.len();
        let mut fields = Vec::new();
        let mut pending = Vec::new();

        for info in descriptor.attributes {
            let reference = format!("{}{}", prefix, info.property);
            match info.source {
                AttributeSource::Relation(_) => pending.push((info.property, reference)),
                AttributeSource::Direct | AttributeSource::Related { .. } => {
                    // A flat attribute merged into a raised one reads the
                    // raised attribute's column.
                    let attribute = self.definition.attribute(&reference)?;
                    let column = attribute.reference_name.clone();
                    let ordinal = self.ordinal(&column);
                    fields.push(FieldBinding {
                        property: info.property,
                        column,
                        ordinal,
                        key: info.is_direct() && descriptor.is_key(info.property),
                    });
                }
            }
        }

        self.nodes.push(PlanNode {
            entity: descriptor.name,
            location,
            property,
            parent,
            fields,
            relations: Vec::new(),
        });

        for (relation_property, reference) in pending {
            let attribute = self.definition.attribute(&reference)?;
            let nested = nested_descriptor(descriptor, relation_property).ok_or_else(|| {
                Error::lookup(
                    LookupErrorKind::Attribute,
                    relation_property,
                    descriptor.name,
                )
            })?;
            let child = self.bind(
                nested,
                format!("{}.", reference),
                Some(relation_property),
                Some(index),
                attribute.resolved_location().clone(),
            )?;
            self.nodes[index].relations.push((relation_property, child));
        }
        Ok(index)
    }

    /// Exact match first, then ignoring case.
    fn ordinal(&self, column: &str) -> Option<usize> {
        self.ordinals.get(column).copied().or_else(|| {
            self.columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(column))
        })
    }
}

fn nested_descriptor(
    descriptor: &'static EntityDescriptor,
    property: &str,
) -> Option<&'static EntityDescriptor> {
    match descriptor.attribute(property)?.source {
        AttributeSource::Relation(relation) => Some((relation.entity)()),
        _ => None,
    }
}
