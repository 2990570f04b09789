//! UPDATE compilation over the fake table.

mod fixtures;

use fixtures::{DataRow, FakeRelatedRow, RELATED_JOINS, joined, placeholders};
use sqlentity_core::{Error, Value};
use sqlentity_query::{ItemSelection, SqlUpdate};

const COLUMNS: [sqlentity_core::Attr<DataRow>; 6] = [
    DataRow::NORMAL_COLUMN,
    DataRow::NULLABLE_COLUMN,
    DataRow::VALUE_COLUMN,
    DataRow::NULLABLE_VALUE_COLUMN,
    DataRow::ANOTHER_VALUE_COLUMN,
    DataRow::ANOTHER_COLUMN,
];

fn by_id() -> ItemSelection<DataRow> {
    ItemSelection::<DataRow>::new()
        .unwrap()
        .where_equal(DataRow::FAKE_DATA_ID, 43)
        .unwrap()
}

#[test]
fn update_with_join_and_null_values() {
    let selection = by_id()
        .inner_join_as(
            DataRow::FAKE_RELATED_ID,
            FakeRelatedRow::FAKE_RELATED_ID,
            "Related",
        )
        .unwrap();
    let update = SqlUpdate::new(selection)
        .set_attributes(&DataRow::sample(), &COLUMNS)
        .unwrap();

    assert_eq!(
        update.execution_statement().unwrap(),
        "UPDATE [dbo].[FakeData]\n\
         SET [dbo].[FakeData].[NormalColumn] = @0, [dbo].[FakeData].[NullableColumn] = NULL, \
         [dbo].[FakeData].[ValueColumn] = @1, [dbo].[FakeData].[NullableValueColumn] = NULL, \
         [dbo].[FakeData].[AnotherValueColumn] = @2, [dbo].[FakeData].[AnotherColumn] = @3\n\
         FROM [dbo].[FakeData]\n\
         INNER JOIN [dbo].[FakeRelated] AS [Related] ON \
         [dbo].[FakeData].[FakeRelatedId] = [Related].[FakeRelatedId]\n\
         WHERE [dbo].[FakeData].[FakeDataId] = @4"
    );
    assert_eq!(
        update.execution_parameters().unwrap(),
        &[
            Value::from("Normal"),
            Value::Int(2),
            Value::Int(22),
            Value::from("Another"),
            Value::Int(43),
        ]
    );
    let found = placeholders(update.execution_statement().unwrap());
    assert_eq!(found, vec![0, 1, 2, 3, 4]);
}

#[test]
fn update_through_aliased_joins_numbers_filters_after_set_values() {
    let selection = joined()
        .where_equal(DataRow::VALUE_COLUMN, 2)
        .unwrap()
        .where_like(DataRow::NULLABLE_COLUMN, "%Nullable%")
        .unwrap()
        .where_equal(DataRow::NULLABLE_VALUE_COLUMN, None::<i32>)
        .unwrap()
        .where_between(DataRow::ANOTHER_VALUE_COLUMN, 10, 30)
        .unwrap();
    let update = SqlUpdate::new(selection)
        .set_attributes(
            &DataRow::sample(),
            &[
                DataRow::NORMAL_COLUMN,
                DataRow::NULLABLE_COLUMN,
                DataRow::VALUE_COLUMN,
                DataRow::ANOTHER_VALUE_COLUMN,
                DataRow::ANOTHER_COLUMN,
            ],
        )
        .unwrap();
    let text = update.execution_statement().unwrap();

    assert_eq!(
        text,
        format!(
            "UPDATE [dbo].[FakeData]\n\
             SET [dbo].[FakeData].[NormalColumn] = @0, [dbo].[FakeData].[NullableColumn] = NULL, \
             [dbo].[FakeData].[ValueColumn] = @1, [dbo].[FakeData].[AnotherValueColumn] = @2, \
             [dbo].[FakeData].[AnotherColumn] = @3\n\
             FROM [dbo].[FakeData]\n{RELATED_JOINS}\n\
             WHERE [dbo].[FakeData].[ValueColumn] = @4 \
             AND [dbo].[FakeData].[NullableColumn] LIKE @5 \
             AND [dbo].[FakeData].[NullableValueColumn] IS NULL \
             AND [dbo].[FakeData].[AnotherValueColumn] BETWEEN @6 AND @7"
        )
    );
    let parameters = update.execution_parameters().unwrap();
    assert_eq!(
        parameters,
        &[
            Value::from("Normal"),
            Value::Int(2),
            Value::Int(22),
            Value::from("Another"),
            Value::Int(2),
            Value::from("%Nullable%"),
            Value::Int(10),
            Value::Int(30),
        ]
    );
    let found = placeholders(text);
    assert_eq!(found, (0..parameters.len()).collect::<Vec<_>>());
}

#[test]
fn update_without_relations_sets_every_updateable_column() {
    let update = SqlUpdate::new(by_id()).set(&DataRow::sample()).unwrap();

    assert_eq!(
        update.execution_statement().unwrap(),
        "UPDATE [dbo].[FakeData]\n\
         SET [dbo].[FakeData].[NormalColumn] = @0, [dbo].[FakeData].[NullableColumn] = NULL, \
         [dbo].[FakeData].[ValueColumn] = @1, [dbo].[FakeData].[NullableValueColumn] = NULL, \
         [dbo].[FakeData].[AnotherColumn] = @2, [dbo].[FakeData].[AnotherValueColumn] = @3, \
         [dbo].[FakeData].[FakeRelatedId] = @4\n\
         WHERE [dbo].[FakeData].[FakeDataId] = @5"
    );
    assert_eq!(update.execution_parameters().unwrap().len(), 6);
}

#[test]
fn later_values_replace_earlier_assignments() {
    let update = SqlUpdate::new(by_id())
        .set_value(DataRow::VALUE_COLUMN, 1)
        .unwrap()
        .set_value(DataRow::NORMAL_COLUMN, "Changed")
        .unwrap()
        .set_value(DataRow::VALUE_COLUMN, 9)
        .unwrap();

    assert_eq!(update.assignments().len(), 2);
    assert_eq!(
        update.execution_statement().unwrap(),
        "UPDATE [dbo].[FakeData]\n\
         SET [dbo].[FakeData].[ValueColumn] = @0, [dbo].[FakeData].[NormalColumn] = @1\n\
         WHERE [dbo].[FakeData].[FakeDataId] = @2"
    );
    assert_eq!(
        update.execution_parameters().unwrap(),
        &[Value::Int(9), Value::from("Changed"), Value::Int(43)]
    );
}

#[test]
fn compiled_update_is_stable() {
    let update = SqlUpdate::new(by_id()).set(&DataRow::sample()).unwrap();
    let first = update.compile().unwrap();
    let second = update.compile().unwrap();
    assert_eq!(first, second);
    assert_eq!(update.statement().unwrap(), &first);
}

#[test]
fn identity_column_cannot_be_set() {
    let err = SqlUpdate::new(by_id())
        .set_value(DataRow::FAKE_DATA_ID, 1)
        .unwrap_err();
    assert!(matches!(err, Error::Argument(_)));
}

#[test]
fn update_needs_an_assignment() {
    let update = SqlUpdate::new(by_id());
    assert!(matches!(update.compile(), Err(Error::Argument(_))));
}

#[test]
fn update_rejects_derived_sources() {
    let selection = ItemSelection::from_selection(by_id()).unwrap();
    let update = SqlUpdate::new(selection)
        .set_value(DataRow::VALUE_COLUMN, 1)
        .unwrap();
    assert!(matches!(update.compile(), Err(Error::Argument(_))));
}
