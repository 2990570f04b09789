//! A flat fake table with a small chain of related tables.

#![allow(dead_code)]

use sqlentity_core::{Attr, AttributeInfo, Entity, EntityDescriptor, EntityValues, Value};
use sqlentity_query::ItemSelection;

#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub fake_data_id: i32,
    pub normal_column: String,
    pub nullable_column: Option<String>,
    pub value_column: i32,
    pub nullable_value_column: Option<i32>,
    pub another_column: String,
    pub another_value_column: i32,
    pub fake_related_id: i32,
}

impl DataRow {
    pub const FAKE_DATA_ID: Attr<Self> = Attr::new("FakeDataId");
    pub const NORMAL_COLUMN: Attr<Self> = Attr::new("NormalColumn");
    pub const NULLABLE_COLUMN: Attr<Self> = Attr::new("NullableColumn");
    pub const VALUE_COLUMN: Attr<Self> = Attr::new("ValueColumn");
    pub const NULLABLE_VALUE_COLUMN: Attr<Self> = Attr::new("NullableValueColumn");
    pub const ANOTHER_COLUMN: Attr<Self> = Attr::new("AnotherColumn");
    pub const ANOTHER_VALUE_COLUMN: Attr<Self> = Attr::new("AnotherValueColumn");
    pub const FAKE_RELATED_ID: Attr<Self> = Attr::new("FakeRelatedId");

    pub fn sample() -> Self {
        Self {
            fake_data_id: 43,
            normal_column: "Normal".to_string(),
            nullable_column: None,
            value_column: 2,
            nullable_value_column: None,
            another_column: "Another".to_string(),
            another_value_column: 22,
            fake_related_id: 3,
        }
    }
}

impl Entity for DataRow {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeData",
            &[
                AttributeInfo::column("FakeDataId"),
                AttributeInfo::column("NormalColumn"),
                AttributeInfo::column("NullableColumn"),
                AttributeInfo::column("ValueColumn"),
                AttributeInfo::column("NullableValueColumn"),
                AttributeInfo::column("AnotherColumn"),
                AttributeInfo::column("AnotherValueColumn"),
                AttributeInfo::column("FakeRelatedId"),
            ],
        )
        .primary_key(&["FakeDataId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

impl EntityValues for DataRow {
    fn value(&self, property: &str) -> Option<Value> {
        match property {
            "FakeDataId" => Some(Value::from(self.fake_data_id)),
            "NormalColumn" => Some(Value::from(self.normal_column.as_str())),
            "NullableColumn" => Some(Value::from(self.nullable_column.clone())),
            "ValueColumn" => Some(Value::from(self.value_column)),
            "NullableValueColumn" => Some(Value::from(self.nullable_value_column)),
            "AnotherColumn" => Some(Value::from(self.another_column.as_str())),
            "AnotherValueColumn" => Some(Value::from(self.another_value_column)),
            "FakeRelatedId" => Some(Value::from(self.fake_related_id)),
            _ => None,
        }
    }
}

pub struct FakeRelatedRow;

impl FakeRelatedRow {
    pub const FAKE_RELATED_ID: Attr<Self> = Attr::new("FakeRelatedId");
    pub const RELATED_PROPERTY: Attr<Self> = Attr::new("RelatedProperty");
    pub const FAKE_DEPENDENCY_ID: Attr<Self> = Attr::new("FakeDependencyId");
}

impl Entity for FakeRelatedRow {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeRelated",
            &[
                AttributeInfo::column("FakeRelatedId"),
                AttributeInfo::column("RelatedProperty"),
                AttributeInfo::column("FakeDependencyId"),
            ],
        )
        .primary_key(&["FakeRelatedId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

pub struct FakeDependencyRow;

impl FakeDependencyRow {
    pub const FAKE_DEPENDENCY_ID: Attr<Self> = Attr::new("FakeDependencyId");
}

impl Entity for FakeDependencyRow {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeDependency",
            &[
                AttributeInfo::column("FakeDependencyId"),
                AttributeInfo::column("DependencyName"),
            ],
        )
        .primary_key(&["FakeDependencyId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

/// Every column of `DataRow`, as the default projection renders them.
pub const DATA_COLUMNS: &str = "[dbo].[FakeData].[FakeDataId], [dbo].[FakeData].[NormalColumn], \
[dbo].[FakeData].[NullableColumn], [dbo].[FakeData].[ValueColumn], \
[dbo].[FakeData].[NullableValueColumn], [dbo].[FakeData].[AnotherColumn], \
[dbo].[FakeData].[AnotherValueColumn], [dbo].[FakeData].[FakeRelatedId]";

/// The three aliased joins [`joined`] adds, as rendered.
pub const RELATED_JOINS: &str = "INNER JOIN [dbo].[FakeRelated] AS [Related] ON \
[dbo].[FakeData].[FakeRelatedId] = [Related].[FakeRelatedId]\n\
LEFT JOIN [dbo].[FakeDependency] AS [RelatedDependency] ON \
[Related].[FakeDependencyId] = [RelatedDependency].[FakeDependencyId]\n\
INNER JOIN [dbo].[FakeRelated] AS [OtherAlias] ON \
[dbo].[FakeData].[FakeRelatedId] = [OtherAlias].[FakeRelatedId]";

/// `DataRow` joined through three aliased related tables.
pub fn joined() -> ItemSelection<DataRow> {
    ItemSelection::<DataRow>::new()
        .unwrap()
        .inner_join_as(
            DataRow::FAKE_RELATED_ID,
            FakeRelatedRow::FAKE_RELATED_ID,
            "Related",
        )
        .unwrap()
        .left_join_from(
            FakeRelatedRow::FAKE_DEPENDENCY_ID,
            Some("Related"),
            FakeDependencyRow::FAKE_DEPENDENCY_ID,
            Some("RelatedDependency"),
        )
        .unwrap()
        .inner_join_from(
            DataRow::FAKE_RELATED_ID,
            None,
            FakeRelatedRow::FAKE_RELATED_ID,
            Some("OtherAlias"),
        )
        .unwrap()
}

/// Placeholder indexes in text order.
pub fn placeholders(text: &str) -> Vec<usize> {
    let pattern = regex::Regex::new(r"@(\d+)").unwrap();
    pattern
        .captures_iter(text)
        .map(|c| c[1].parse().unwrap())
        .collect()
}
