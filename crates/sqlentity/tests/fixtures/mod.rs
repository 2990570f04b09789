//! A fake domain model: a complex entity with nested and aliased
//! relations plus a left-joined dependent, a flat row over the same table, a four-level
//! relation chain, and a structure type for table-valued commands.

#![allow(dead_code)]

use sqlentity::{
    Attr, AttributeInfo, Entity, EntityDescriptor, EntityRecord, EntityValues, FromRecord,
    Result, Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeSubSubEntity {
    pub fake_sub_sub_entity_id: i32,
    pub unique_test_item: String,
}

impl Entity for FakeSubSubEntity {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeSubSubEntity",
            &[
                AttributeInfo::column("FakeSubSubEntityId"),
                AttributeInfo::column("UniqueTestItem"),
            ],
        )
        .primary_key(&["FakeSubSubEntityId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

impl FromRecord for FakeSubSubEntity {
    fn from_record(record: &EntityRecord<'_>) -> Result<Self> {
        Ok(Self {
            fake_sub_sub_entity_id: record.get("FakeSubSubEntityId")?,
            unique_test_item: record.get("UniqueTestItem")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeSubEntity {
    pub fake_sub_entity_id: i32,
    pub unique_other_id: i16,
    pub description: Option<String>,
    pub fake_sub_sub_entity_id: i32,
    pub sub_sub_entity: Option<FakeSubSubEntity>,
}

impl FakeSubEntity {
    pub const FAKE_SUB_ENTITY_ID: Attr<Self> = Attr::new("FakeSubEntityId");
}

impl Entity for FakeSubEntity {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeSubEntity",
            &[
                AttributeInfo::column("FakeSubEntityId"),
                AttributeInfo::column("UniqueOtherId"),
                AttributeInfo::column("Description"),
                AttributeInfo::column("FakeSubSubEntityId"),
                AttributeInfo::relation(
                    "SubSubEntity",
                    FakeSubSubEntity::descriptor,
                    "FakeSubSubEntityId",
                    "FakeSubSubEntityId",
                ),
            ],
        )
        .primary_key(&["FakeSubEntityId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

impl FromRecord for FakeSubEntity {
    fn from_record(record: &EntityRecord<'_>) -> Result<Self> {
        Ok(Self {
            fake_sub_entity_id: record.get("FakeSubEntityId")?,
            unique_other_id: record.get("UniqueOtherId")?,
            description: record.get("Description")?,
            fake_sub_sub_entity_id: record.get("FakeSubSubEntityId")?,
            sub_sub_entity: record.relation("SubSubEntity")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeMultiReferenceEntity {
    pub fake_multi_reference_entity_id: i32,
    pub unique_name: String,
}

impl Entity for FakeMultiReferenceEntity {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeMultiReferenceEntity",
            &[
                AttributeInfo::column("FakeMultiReferenceEntityId"),
                AttributeInfo::column("UniqueName"),
            ],
        )
        .primary_key(&["FakeMultiReferenceEntityId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

impl FromRecord for FakeMultiReferenceEntity {
    fn from_record(record: &EntityRecord<'_>) -> Result<Self> {
        Ok(Self {
            fake_multi_reference_entity_id: record.get("FakeMultiReferenceEntityId")?,
            unique_name: record.get("UniqueName")?,
        })
    }
}

/// Optional one-to-one extension of the complex entity, sharing its key.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeDependentEntity {
    pub fake_dependent_entity_id: i32,
    pub dependent_integer_value: i32,
    pub dependent_time_value: i64,
}

impl Entity for FakeDependentEntity {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeDependentEntity",
            &[
                AttributeInfo::column("FakeDependentEntityId"),
                AttributeInfo::column("DependentIntegerValue"),
                AttributeInfo::column("DependentTimeValue"),
            ],
        )
        .primary_key(&["FakeDependentEntityId"]);
        &DESCRIPTOR
    }
}

impl FromRecord for FakeDependentEntity {
    fn from_record(record: &EntityRecord<'_>) -> Result<Self> {
        Ok(Self {
            fake_dependent_entity_id: record.get("FakeDependentEntityId")?,
            dependent_integer_value: record.get("DependentIntegerValue")?,
            dependent_time_value: record.get("DependentTimeValue")?,
        })
    }
}

/// The complex entity raised with all of its relations.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeRaisedComplexRow {
    pub fake_complex_entity_id: i32,
    pub unique_name: String,
    pub description: Option<String>,
    pub fake_sub_entity_id: i32,
    pub created_by_id: i32,
    pub modified_by_id: i32,
    /// Declared flat; reads the same column as the nested sub-sub entity
    pub sub_sub_entity_unique_test_item: String,
    pub sub_entity: Option<FakeSubEntity>,
    pub created_by: Option<FakeMultiReferenceEntity>,
    pub modified_by: Option<FakeMultiReferenceEntity>,
    pub complex_entity_dependent: Option<FakeDependentEntity>,
}

impl FakeRaisedComplexRow {
    pub const FAKE_COMPLEX_ENTITY_ID: Attr<Self> = Attr::new("FakeComplexEntityId");
    pub const UNIQUE_NAME: Attr<Self> = Attr::new("UniqueName");
    pub const SUB_ENTITY: Attr<Self> = Attr::new("SubEntity");
    pub const SUB_ENTITY_UNIQUE_OTHER_ID: Attr<Self> = Attr::new("SubEntity.UniqueOtherId");
    pub const SUB_SUB_ENTITY_UNIQUE_TEST_ITEM: Attr<Self> = Attr::new("SubSubEntityUniqueTestItem");
    pub const CREATED_BY_UNIQUE_NAME: Attr<Self> = Attr::new("CreatedBy.UniqueName");
    pub const MODIFIED_BY_UNIQUE_NAME: Attr<Self> = Attr::new("ModifiedBy.UniqueName");
    pub const DEPENDENT_INTEGER_VALUE: Attr<Self> =
        Attr::new("ComplexEntityDependent.DependentIntegerValue");
}

impl Entity for FakeRaisedComplexRow {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeComplexEntity",
            &[
                AttributeInfo::column("FakeComplexEntityId"),
                AttributeInfo::column("UniqueName"),
                AttributeInfo::column("Description"),
                AttributeInfo::column("FakeSubEntityId"),
                AttributeInfo::column("CreatedByFakeMultiReferenceEntityId"),
                AttributeInfo::column("ModifiedByFakeMultiReferenceEntityId"),
                AttributeInfo::related("SubSubEntityUniqueTestItem", FakeSubSubEntity::descriptor)
                    .named("UniqueTestItem"),
                AttributeInfo::relation(
                    "SubEntity",
                    FakeSubEntity::descriptor,
                    "FakeSubEntityId",
                    "FakeSubEntityId",
                ),
                AttributeInfo::relation(
                    "CreatedBy",
                    FakeMultiReferenceEntity::descriptor,
                    "CreatedByFakeMultiReferenceEntityId",
                    "FakeMultiReferenceEntityId",
                )
                .aliased("CreatedBy"),
                AttributeInfo::relation(
                    "ModifiedBy",
                    FakeMultiReferenceEntity::descriptor,
                    "ModifiedByFakeMultiReferenceEntityId",
                    "FakeMultiReferenceEntityId",
                )
                .aliased("ModifiedBy"),
                AttributeInfo::relation(
                    "ComplexEntityDependent",
                    FakeDependentEntity::descriptor,
                    "FakeComplexEntityId",
                    "FakeDependentEntityId",
                )
                .left_join(),
            ],
        )
        .primary_key(&["FakeComplexEntityId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

impl FromRecord for FakeRaisedComplexRow {
    fn from_record(record: &EntityRecord<'_>) -> Result<Self> {
        Ok(Self {
            fake_complex_entity_id: record.get("FakeComplexEntityId")?,
            unique_name: record.get("UniqueName")?,
            description: record.get("Description")?,
            fake_sub_entity_id: record.get("FakeSubEntityId")?,
            created_by_id: record.get("CreatedByFakeMultiReferenceEntityId")?,
            modified_by_id: record.get("ModifiedByFakeMultiReferenceEntityId")?,
            sub_sub_entity_unique_test_item: record.get("SubSubEntityUniqueTestItem")?,
            sub_entity: record.relation("SubEntity")?,
            created_by: record.relation("CreatedBy")?,
            modified_by: record.relation("ModifiedBy")?,
            complex_entity_dependent: record.relation("ComplexEntityDependent")?,
        })
    }
}

/// The complex entity's own table, with one flat column from the sub entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeComplexRow {
    pub fake_complex_entity_id: i32,
    pub unique_name: String,
    pub description: Option<String>,
    pub fake_sub_entity_id: i32,
    pub created_by_id: i32,
    pub modified_by_id: Option<i32>,
    pub sub_entity_description: Option<String>,
}

impl FakeComplexRow {
    pub const FAKE_COMPLEX_ENTITY_ID: Attr<Self> = Attr::new("FakeComplexEntityId");
    pub const UNIQUE_NAME: Attr<Self> = Attr::new("UniqueName");
    pub const DESCRIPTION: Attr<Self> = Attr::new("Description");
    pub const FAKE_SUB_ENTITY_ID: Attr<Self> = Attr::new("FakeSubEntityId");
    pub const MODIFIED_BY_ID: Attr<Self> = Attr::new("ModifiedByFakeMultiReferenceEntityId");
    pub const SUB_ENTITY_DESCRIPTION: Attr<Self> = Attr::new("SubEntityDescription");

    pub fn sample() -> Self {
        Self {
            fake_complex_entity_id: 423,
            unique_name: "Unique".to_string(),
            description: None,
            fake_sub_entity_id: 87,
            created_by_id: 11,
            modified_by_id: None,
            sub_entity_description: Some("Sub".to_string()),
        }
    }
}

impl Entity for FakeComplexRow {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FakeComplexEntity",
            &[
                AttributeInfo::column("FakeComplexEntityId"),
                AttributeInfo::column("UniqueName"),
                AttributeInfo::column("Description"),
                AttributeInfo::column("FakeSubEntityId"),
                AttributeInfo::column("CreatedByFakeMultiReferenceEntityId"),
                AttributeInfo::column("ModifiedByFakeMultiReferenceEntityId"),
                AttributeInfo::related("SubEntityDescription", FakeSubEntity::descriptor)
                    .named("Description"),
            ],
        )
        .primary_key(&["FakeComplexEntityId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

impl EntityValues for FakeComplexRow {
    fn value(&self, property: &str) -> Option<Value> {
        match property {
            "FakeComplexEntityId" => Some(Value::from(self.fake_complex_entity_id)),
            "UniqueName" => Some(Value::from(self.unique_name.as_str())),
            "Description" => Some(Value::from(self.description.clone())),
            "FakeSubEntityId" => Some(Value::from(self.fake_sub_entity_id)),
            "CreatedByFakeMultiReferenceEntityId" => Some(Value::from(self.created_by_id)),
            "ModifiedByFakeMultiReferenceEntityId" => Some(Value::from(self.modified_by_id)),
            "SubEntityDescription" => Some(Value::from(self.sub_entity_description.clone())),
            _ => None,
        }
    }
}

macro_rules! chain_level {
    ($ty:ident, $name:literal, $id:literal, [$($next:tt)*]) => {
        pub struct $ty;

        impl Entity for $ty {
            fn descriptor() -> &'static EntityDescriptor {
                static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
                    $name,
                    &[
                        AttributeInfo::column($id),
                        AttributeInfo::column("Name"),
                        $($next)*
                    ],
                )
                .primary_key(&[$id]);
                &DESCRIPTOR
            }
        }
    };
}

chain_level!(
    ChainLevel3,
    "ChainLevel3",
    "ChainLevel3Id",
    []
);
chain_level!(
    ChainLevel2,
    "ChainLevel2",
    "ChainLevel2Id",
    [
        AttributeInfo::column("ChainLevel3Id"),
        AttributeInfo::relation("Level3", ChainLevel3::descriptor, "ChainLevel3Id", "ChainLevel3Id")
            .left_join(),
    ]
);
chain_level!(
    ChainLevel1,
    "ChainLevel1",
    "ChainLevel1Id",
    [
        AttributeInfo::column("ChainLevel2Id"),
        AttributeInfo::relation("Level2", ChainLevel2::descriptor, "ChainLevel2Id", "ChainLevel2Id"),
    ]
);
chain_level!(
    ChainRoot,
    "ChainRoot",
    "ChainRootId",
    [
        AttributeInfo::column("ChainLevel1Id"),
        AttributeInfo::relation("Level1", ChainLevel1::descriptor, "ChainLevel1Id", "ChainLevel1Id"),
    ]
);

/// Target table of the structured commands.
pub struct FieldValueRow;

impl Entity for FieldValueRow {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FieldValue",
            &[
                AttributeInfo::column("FieldValueId"),
                AttributeInfo::column("FieldId"),
                AttributeInfo::column("EntityId"),
                AttributeInfo::column("TextValue"),
                AttributeInfo::column("LastModifiedTime"),
            ],
        )
        .primary_key(&["FieldValueId"])
        .auto_increment();
        &DESCRIPTOR
    }
}

/// One row of the `FieldValueTableType` structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValueTableTypeRow {
    pub field_value_id: i64,
    pub field_id: i32,
    pub entity_id: i64,
    pub text_value: Option<String>,
    pub last_modified_time: i64,
    pub import_hash: Vec<u8>,
}

impl FieldValueTableTypeRow {
    pub const FIELD_ID: Attr<Self> = Attr::new("FieldId");
    pub const ENTITY_ID: Attr<Self> = Attr::new("EntityId");
    pub const IMPORT_HASH: Attr<Self> = Attr::new("ImportHash");

    pub fn batch() -> Vec<Self> {
        (1..=3)
            .map(|i| Self {
                field_value_id: 0,
                field_id: i,
                entity_id: 500,
                text_value: (i != 2).then(|| format!("Value {i}")),
                last_modified_time: 1_700_000_000_000_000,
                import_hash: vec![i as u8; 4],
            })
            .collect()
    }
}

impl Entity for FieldValueTableTypeRow {
    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: EntityDescriptor = EntityDescriptor::new(
            "FieldValueTableTypeRow",
            &[
                AttributeInfo::column("FieldValueId"),
                AttributeInfo::column("FieldId"),
                AttributeInfo::column("EntityId"),
                AttributeInfo::column("TextValue"),
                AttributeInfo::column("LastModifiedTime"),
                AttributeInfo::column("ImportHash"),
            ],
        )
        .table_type("dbo", "FieldValueTableType");
        &DESCRIPTOR
    }
}

impl EntityValues for FieldValueTableTypeRow {
    fn value(&self, property: &str) -> Option<Value> {
        match property {
            "FieldValueId" => Some(Value::BigInt(self.field_value_id)),
            "FieldId" => Some(Value::Int(self.field_id)),
            "EntityId" => Some(Value::BigInt(self.entity_id)),
            "TextValue" => Some(Value::from(self.text_value.clone())),
            "LastModifiedTime" => Some(Value::Timestamp(self.last_modified_time)),
            "ImportHash" => Some(Value::Bytes(self.import_hash.clone())),
            _ => None,
        }
    }
}

/// The JOIN lines implied by `FakeRaisedComplexRow`'s relations.
pub const RAISED_JOINS: &str = "INNER JOIN [dbo].[FakeSubEntity] ON \
[dbo].[FakeComplexEntity].[FakeSubEntityId] = [dbo].[FakeSubEntity].[FakeSubEntityId]\n\
INNER JOIN [dbo].[FakeSubSubEntity] ON \
[dbo].[FakeSubEntity].[FakeSubSubEntityId] = [dbo].[FakeSubSubEntity].[FakeSubSubEntityId]\n\
INNER JOIN [dbo].[FakeMultiReferenceEntity] AS [CreatedBy] ON \
[dbo].[FakeComplexEntity].[CreatedByFakeMultiReferenceEntityId] = [CreatedBy].[FakeMultiReferenceEntityId]\n\
INNER JOIN [dbo].[FakeMultiReferenceEntity] AS [ModifiedBy] ON \
[dbo].[FakeComplexEntity].[ModifiedByFakeMultiReferenceEntityId] = [ModifiedBy].[FakeMultiReferenceEntityId]\n\
LEFT JOIN [dbo].[FakeDependentEntity] ON \
[dbo].[FakeComplexEntity].[FakeComplexEntityId] = [dbo].[FakeDependentEntity].[FakeDependentEntityId]";
