use std::sync::Arc;

use orchestrator::{ClusterManager, Dispatcher, KubectlCluster, Pipeline, PipelineConfig, ProcessRunner};
use websocket::WsState;

use crate::config::ServiceConfig;

#[derive(Clone)]
pub struct AppState {
    pub ws: Arc<WsState>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            ws: Arc::new(WsState::new(dispatcher)),
        }
    }

    /// Wire the pipeline to `cluster` instead of the real kubectl backend.
    pub fn with_cluster(
        cluster: Arc<dyn ClusterManager>,
        pipeline: PipelineConfig,
        max_concurrent_runs: Option<usize>,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::new(cluster, pipeline));
        Self::new(Dispatcher::new(pipeline).with_max_concurrent(max_concurrent_runs))
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        let cluster = Arc::new(KubectlCluster::new(
            Arc::new(ProcessRunner::new()),
            config.kubectl_config(),
        ));

        tracing::info!(
            kubectl = %config.cluster.kubectl,
            apply_script = %config.cluster.apply_script.display(),
            max_concurrent_runs = ?config.pipeline.max_concurrent_runs,
            "Using kubectl cluster backend"
        );

        Self::with_cluster(
            cluster,
            config.pipeline_config(),
            config.pipeline.max_concurrent_runs,
        )
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.ws.dispatcher
    }
}
