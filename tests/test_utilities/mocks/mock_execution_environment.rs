use async_trait::async_trait;
use graviton_validator::compatibility::domain::{Prerequisites, ProbeOutput, ProbeRequest};
use graviton_validator::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Mock ExecutionEnvironment replaying scripted outputs by probe label.
///
/// Labels without a script succeed with a plain install log.
#[derive(Default)]
pub struct MockExecutionEnvironment {
    outputs: Mutex<Vec<(String, ProbeOutput)>>,
    missing_tools: Vec<String>,
    executed: Mutex<Vec<String>>,
    cleaned_up: AtomicBool,
}

impl MockExecutionEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(self, label: &str, output: ProbeOutput) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .push((label.to_string(), output));
        self
    }

    pub fn with_missing_tool(mut self, tool: &str) -> Self {
        self.missing_tools.push(tool.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn was_cleaned_up(&self) -> bool {
        self.cleaned_up.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionEnvironment for MockExecutionEnvironment {
    fn name(&self) -> &str {
        "mock"
    }

    async fn check_prerequisites(&self, _ecosystem: Ecosystem) -> Prerequisites {
        Prerequisites::from_missing(self.missing_tools.clone())
    }

    async fn execute(&self, request: &ProbeRequest) -> ProbeOutput {
        self.executed.lock().unwrap().push(request.label.clone());
        let mut outputs = self.outputs.lock().unwrap();
        match outputs.iter().position(|(label, _)| *label == request.label) {
            Some(index) => outputs.remove(index).1,
            None => ProbeOutput::succeeded("mock", "added 1 package"),
        }
    }

    async fn cleanup(&self, skip: bool) {
        if !skip {
            self.cleaned_up.store(true, Ordering::SeqCst);
        }
    }
}
