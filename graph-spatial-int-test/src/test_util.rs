use std::backtrace::Backtrace;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use graph_spatial::cypher::{Statements, NODE_COLUMN};
use graph_spatial::{
    CypherQuery, CypherSession, NodeRecord, SpatialConfig, SpatialError, SpatialGateway,
    SpatialResult,
};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::memory_graph::MemoryGraph;

/// Runs a test with retry logic and error handling.
///
/// `after` always runs once `before` succeeded, even when the test fails.
/// Retries cover transient failures of a live server.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> SpatialResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> SpatialResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> SpatialResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| -> Result<(), (String, String)> {
            let backtrace = Backtrace::capture();
            let ctx = before().map_err(|e| {
                (format!("Before run failed: {:?}", e), backtrace.to_string())
            })?;

            match test(ctx.clone()) {
                Ok(_) => after(ctx).map_err(|e| {
                    (format!("After run failed: {:?}", e), backtrace.to_string())
                }),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            }
        });

        let elapsed = start_time.elapsed();
        let (error, backtrace) = match result {
            Ok(Ok(_)) => return,
            Ok(Err(failure)) => failure,
            Err(panic_err) => {
                let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                (format!("Panic: {}", message), Backtrace::capture().to_string())
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("Error: {}", error);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(error);
        last_backtrace = Some(backtrace);
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// Per-test handle on a gateway and the session behind it.
///
/// Layer and geometry names go through [`TestContext::name`] so that tests
/// sharing a live server never see each other's data.
#[derive(Clone)]
pub struct TestContext {
    gateway: SpatialGateway,
    session: Arc<dyn CypherSession>,
    memory: Option<MemoryGraph>,
    suffix: String,
    layers: Arc<Mutex<Vec<String>>>,
    nodes: Arc<Mutex<Vec<i64>>>,
}

impl TestContext {
    pub fn new(session: Arc<dyn CypherSession>, config: SpatialConfig) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        TestContext {
            gateway: SpatialGateway::new(session.clone(), config),
            session,
            memory: None,
            suffix: suffix[..12].to_string(),
            layers: Arc::new(Mutex::new(Vec::new())),
            nodes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_memory_graph(config: SpatialConfig) -> Self {
        let graph = MemoryGraph::new(&config);
        let mut ctx = TestContext::new(Arc::new(graph.clone()), config);
        ctx.memory = Some(graph);
        ctx
    }

    pub fn gateway(&self) -> &SpatialGateway {
        &self.gateway
    }

    /// The in-memory graph, when the context is not backed by a server.
    pub fn memory(&self) -> Option<&MemoryGraph> {
        self.memory.as_ref()
    }

    /// A name unique to this context.
    pub fn name(&self, base: &str) -> String {
        format!("{}_{}", base, self.suffix)
    }

    /// Creates a layer named after `base` and registers it for cleanup.
    pub fn layer(&self, base: &str) -> SpatialResult<String> {
        let layer_name = self.name(base);
        self.gateway.create_layer(&layer_name)?;
        self.track_layer(&layer_name);
        Ok(layer_name)
    }

    pub fn track_layer(&self, layer_name: &str) {
        let mut layers = self.layers.lock();
        if !layers.iter().any(|l| l == layer_name) {
            layers.push(layer_name.to_string());
        }
    }

    /// Creates a node outside any layer, as an application would.
    pub fn create_plain_node(&self, properties: Value) -> SpatialResult<NodeRecord> {
        let properties: Map<String, Value> = serde_json::from_value(properties)?;
        let query = CypherQuery::new(
            "create_node",
            "CREATE (n) SET n = $properties \
             RETURN {id: id(n), labels: labels(n), properties: properties(n)} AS node",
        )
        .param("properties", properties);

        let rows = self.session.run(&query)?;
        let row = rows
            .first()
            .ok_or_else(|| SpatialError::Decode("create_node returned no rows".to_string()))?;
        let node = NodeRecord::from_row(row, NODE_COLUMN)?;
        self.nodes.lock().push(node.id);
        Ok(node)
    }

    /// Reads a node straight from the store, bypassing the gateway.
    pub fn fetch_node(&self, node_id: i64) -> SpatialResult<Option<NodeRecord>> {
        let statements = Statements::new(self.gateway.config().clone());
        match self.session.run(&statements.find_node(node_id))?.first() {
            Some(row) => Ok(Some(NodeRecord::from_row(row, NODE_COLUMN)?)),
            None => Ok(None),
        }
    }

    /// True if a geometry with this name exists in any layer.
    pub fn geometry_exists(&self, geometry_name: &str) -> SpatialResult<bool> {
        match self.gateway.get_geometry(geometry_name, None) {
            Ok(_) | Err(SpatialError::AmbiguousGeometry { .. }) => Ok(true),
            Err(SpatialError::GeometryNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(not(feature = "neo4j"))]
pub fn create_test_context() -> SpatialResult<TestContext> {
    create_test_context_with(SpatialConfig::default())
}

#[cfg(not(feature = "neo4j"))]
pub fn create_test_context_with(config: SpatialConfig) -> SpatialResult<TestContext> {
    Ok(TestContext::with_memory_graph(config))
}

#[cfg(feature = "neo4j")]
pub fn create_test_context() -> SpatialResult<TestContext> {
    create_test_context_with(SpatialConfig::from_env()?)
}

#[cfg(feature = "neo4j")]
pub fn create_test_context_with(config: SpatialConfig) -> SpatialResult<TestContext> {
    use graph_spatial::HttpCypherSession;

    let session = HttpCypherSession::new(&config)?;
    Ok(TestContext::new(Arc::new(session), config))
}

/// Removes the layers and nodes a test created.
///
/// Failures are logged rather than returned so one leftover does not fail
/// an otherwise passing test.
pub fn cleanup(ctx: TestContext) -> SpatialResult<()> {
    let layers: Vec<String> = ctx.layers.lock().drain(..).collect();
    for layer_name in layers {
        match ctx.gateway.delete_layer(&layer_name) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => eprintln!("Warning: Failed to delete layer {}: {:?}", layer_name, e),
        }
    }

    let nodes: Vec<i64> = ctx.nodes.lock().drain(..).collect();
    for node_id in nodes {
        let query = CypherQuery::new(
            "delete_node",
            "MATCH (n) WHERE id(n) = $node_id DETACH DELETE n",
        )
        .param("node_id", node_id);
        if let Err(e) = ctx.session.run(&query) {
            eprintln!("Warning: Failed to delete node {}: {:?}", node_id, e);
        }
    }

    Ok(())
}

/// Rough outline of Cornwall.
pub const CORNWALL_WKT: &str =
    "POLYGON ((-5.7 50.05, -5.05 49.96, -4.2 50.35, -4.18 50.85, -4.55 51.0, -5.15 50.6, -5.7 50.05))";

/// Rough outline of Devon.
pub const DEVON_WKT: &str =
    "POLYGON ((-4.2 50.35, -3.5 50.2, -2.9 50.7, -3.0 51.2, -4.2 51.2, -4.55 51.0, -4.18 50.85, -4.2 50.35))";

/// Orders geometry names for set-style comparisons.
pub fn sorted_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = names.into_iter().map(str::to_string).collect();
    names.sort();
    names
}
