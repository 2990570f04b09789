//! Raised entity materialization with cached binding plans.

use crate::graph::{FromRecord, RecordGraph};
use crate::plan::{BindingPlan, reader_columns};
use crate::scope::MaterializationScope;
use sqlentity_core::{Entity, EntityDefinition, EntityLocation, RecordReader, Result, definition_of};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// A reader positioned on a row, and the definition to read it as.
#[derive(Clone)]
pub struct PocoDataRequest<'a> {
    reader: &'a dyn RecordReader,
    definition: Arc<EntityDefinition>,
}

impl<'a> PocoDataRequest<'a> {
    pub fn new(reader: &'a dyn RecordReader, definition: Arc<EntityDefinition>) -> Self {
        Self { reader, definition }
    }

    /// A request reading `T`'s resolved definition.
    pub fn for_entity<T: Entity>(reader: &'a dyn RecordReader) -> Result<Self> {
        Ok(Self::new(reader, definition_of::<T>()?))
    }

    pub fn reader(&self) -> &'a dyn RecordReader {
        self.reader
    }

    pub fn definition(&self) -> &Arc<EntityDefinition> {
        &self.definition
    }
}

impl fmt::Debug for PocoDataRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PocoDataRequest")
            .field("entity", &self.definition.entity_name())
            .field("fields", &self.reader.field_count())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PlanKey {
    location: EntityLocation,
    /// Row types of one table share a location; the descriptor tells them apart.
    descriptor: usize,
    columns: Vec<String>,
}

/// Builds raised entities from reader rows.
///
/// Binding plans are derived once per (definition, reader columns) shape
/// and shared. The cache is read-mostly: a miss builds the plan outside the
/// lock and the first stored plan wins.
#[derive(Debug, Default)]
pub struct RaisedPocoFactory {
    plans: RwLock<HashMap<PlanKey, Arc<BindingPlan>>>,
}

impl RaisedPocoFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide factory.
    pub fn global() -> &'static RaisedPocoFactory {
        static FACTORY: OnceLock<RaisedPocoFactory> = OnceLock::new();
        FACTORY.get_or_init(RaisedPocoFactory::new)
    }

    /// The binding plan for the request's shape.
    pub fn binding_plan(&self, request: &PocoDataRequest<'_>) -> Result<Arc<BindingPlan>> {
        let definition = request.definition();
        let columns = reader_columns(request.reader());
        let key = PlanKey {
            location: definition.location().clone(),
            descriptor: std::ptr::from_ref(definition.descriptor()) as usize,
            columns,
        };

        {
            let plans = self.plans.read().unwrap_or_else(|e| e.into_inner());
            if let Some(plan) = plans.get(&key) {
                return Ok(Arc::clone(plan));
            }
        }

        let plan = Arc::new(BindingPlan::for_columns(definition, key.columns.clone())?);
        let mut plans = self.plans.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(plans.entry(key).or_insert(plan)))
    }

    /// Read the request's row into a record graph.
    pub fn create_graph(
        &self,
        request: &PocoDataRequest<'_>,
        scope: Option<&mut MaterializationScope>,
    ) -> Result<RecordGraph> {
        let plan = self.binding_plan(request)?;
        RecordGraph::read(plan, request.reader(), scope)
    }

    /// Materialize the request's row as `T`.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn create_poco<T: FromRecord>(&self, request: &PocoDataRequest<'_>) -> Result<T> {
        let graph = self.create_graph(request, None)?;
        T::from_record(&graph.root()?)
    }

    /// Materialize the request's row as `T`, sharing nested records through
    /// `scope`.
    pub fn create_poco_in<T: FromRecord>(
        &self,
        request: &PocoDataRequest<'_>,
        scope: &mut MaterializationScope,
    ) -> Result<T> {
        let graph = self.create_graph(request, Some(scope))?;
        T::from_record(&graph.root()?)
    }

    /// Materialize every row as `T`, sharing nested records across rows.
    #[tracing::instrument(level = "trace", skip(self, definition, rows))]
    pub fn create_pocos<T: FromRecord, R: RecordReader>(
        &self,
        definition: &Arc<EntityDefinition>,
        rows: &[R],
    ) -> Result<Vec<T>> {
        let mut scope = MaterializationScope::new();
        let items = rows
            .iter()
            .map(|row| {
                let request = PocoDataRequest::new(row, Arc::clone(definition));
                self.create_poco_in(&request, &mut scope)
            })
            .collect::<Result<Vec<T>>>()?;
        tracing::debug!(
            entity = definition.entity_name(),
            rows = items.len(),
            shared = scope.len(),
            "Materialized rows"
        );
        Ok(items)
    }

    /// Number of cached plans.
    pub fn cached_plans(&self) -> usize {
        self.plans.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Materialize one row as `T` with the process-wide factory.
pub fn materialize<T: Entity + FromRecord>(reader: &dyn RecordReader) -> Result<T> {
    let request = PocoDataRequest::for_entity::<T>(reader)?;
    RaisedPocoFactory::global().create_poco(&request)
}
