// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Workflow Engine (spec §4.3): loads YAML workflow definitions, starts
//! instances, and advances their step DAG to completion.
//!
//! Ready-set scheduling, `condition` evaluation, and `Signal` wake-ups are
//! driven by [`crate::expr::evaluate_bool`] and the same [`EventBus`]
//! publish-on-commit discipline the dispatcher uses; `Approval` steps are
//! additionally surfaced as a [`Decision`] record (SPEC_FULL §10.7).

use orbitmesh_core::workflow::{InstanceStatus, Step, StepKind, StepStatus};
use orbitmesh_core::{
    Clock, Decision, DecisionId, DecisionOption, EntityKind, Event, InstanceId, JobId, JobRequest,
    JobStatus, OrbitError, Result, StepId, WorkflowDefinition, WorkflowId, WorkflowInstance,
};
use orbitmesh_store::Store;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatcher::Dispatcher;
use crate::event_bus::EventBus;
use crate::expr;

pub struct WorkflowEngine<C: Clock> {
    store: Arc<dyn Store>,
    bus: Arc<EventBus>,
    dispatcher: Arc<Dispatcher<C>>,
    clock: C,
}

impl<C: Clock> WorkflowEngine<C> {
    pub fn new(store: Arc<dyn Store>, bus: Arc<EventBus>, dispatcher: Arc<Dispatcher<C>>, clock: C) -> Self {
        Self { store, bus, dispatcher, clock }
    }

    /// Parse a YAML workflow definition (spec §10.1's YAML config convention,
    /// applied to workflow authoring).
    pub fn parse_definition(yaml: &str) -> Result<WorkflowDefinition> {
        serde_yaml::from_str(yaml)
            .map_err(|e| OrbitError::invalid_argument(format!("invalid workflow definition: {e}")))
    }

    /// Register a definition after validating its DAG (spec invariant 5 and
    /// the "no cycles, no dangling references" structural requirement).
    pub async fn register(&self, definition: WorkflowDefinition) -> Result<()> {
        validate_dag(&definition)?;
        self.store.put_workflow_definition(definition).await
    }

    pub async fn get_definition(&self, id: &WorkflowId) -> Result<WorkflowDefinition> {
        self.store
            .get_workflow_definition(id)
            .await?
            .ok_or_else(|| OrbitError::not_found(EntityKind::WorkflowDefinition, id.to_string()))
    }

    pub async fn start(
        &self,
        workflow_id: &WorkflowId,
        input: HashMap<String, serde_json::Value>,
    ) -> Result<WorkflowInstance> {
        let definition = self.get_definition(workflow_id).await?;
        let mut instance = WorkflowInstance::new(&definition, input, self.clock.epoch_ms());
        instance.status = InstanceStatus::Running;
        self.store.put_workflow_instance(instance.clone()).await?;
        self.bus.publish(Event::WorkflowInstanceStarted {
            instance_id: instance.id,
            workflow_id: definition.id,
        });
        self.advance(&mut instance, &definition).await?;
        self.store.put_workflow_instance(instance.clone()).await?;
        Ok(instance)
    }

    pub async fn get_instance(&self, id: &InstanceId) -> Result<WorkflowInstance> {
        let mut instance = self
            .store
            .get_workflow_instance(id)
            .await?
            .ok_or_else(|| OrbitError::not_found(EntityKind::WorkflowInstance, id.to_string()))?;
        self.rehydrate_waiting_on(&mut instance).await?;
        Ok(instance)
    }

    /// `StepInstance::waiting_on` isn't persisted; fill it back in for any
    /// step still parked `WaitingForEvent` so `signal` can match it again
    /// after a reload (spec §4.3 "Pause-resume").
    async fn rehydrate_waiting_on(&self, instance: &mut WorkflowInstance) -> Result<()> {
        let needs_it =
            instance.step_instances.values().any(|s| s.status == StepStatus::WaitingForEvent && s.waiting_on.is_none());
        if !needs_it {
            return Ok(());
        }
        let definition = self.get_definition(&instance.workflow_id).await?;
        for (step_id, step_instance) in instance.step_instances.iter_mut() {
            if step_instance.status == StepStatus::WaitingForEvent && step_instance.waiting_on.is_none() {
                step_instance.waiting_on = definition.waiting_on_for(step_id);
            }
        }
        Ok(())
    }

    /// Re-evaluate readiness and start every newly-ready step (spec §4.3
    /// "Scheduling"). Idempotent: steps already started or terminal are
    /// untouched.
    async fn advance(&self, instance: &mut WorkflowInstance, definition: &WorkflowDefinition) -> Result<()> {
        if instance.status.is_terminal() {
            return Ok(());
        }
        let mut progressed = true;
        while progressed {
            progressed = false;
            for step in &definition.steps {
                let current = instance.step_instances.get(&step.id).map(|s| s.status);
                if current == Some(StepStatus::Running) {
                    if let StepKind::Delay { duration_ms } = &step.kind {
                        if self.delay_elapsed(instance, &step.id, *duration_ms) {
                            self.complete_step(instance, &step.id, StepStatus::Completed, None, None);
                            progressed = true;
                        }
                    }
                    continue;
                }
                if current != Some(StepStatus::Pending) {
                    continue;
                }
                if !self.dependencies_satisfied(instance, step) {
                    continue;
                }
                if let Some(expr) = &step.condition {
                    let vars = instance.variables.clone();
                    let truthy = expr::evaluate_bool(expr, &vars).unwrap_or(false);
                    if !truthy {
                        self.complete_step(instance, &step.id, StepStatus::Skipped, None, None);
                        progressed = true;
                        continue;
                    }
                }
                self.start_step(instance, step, definition).await?;
                progressed = true;
            }
            self.maybe_finish(instance, definition);
        }
        Ok(())
    }

    fn delay_elapsed(&self, instance: &WorkflowInstance, step_id: &StepId, duration_ms: u64) -> bool {
        instance
            .step_instances
            .get(step_id)
            .and_then(|s| s.started_at_ms)
            .map(|started| self.clock.epoch_ms().saturating_sub(started) >= duration_ms)
            .unwrap_or(false)
    }

    fn dependencies_satisfied(&self, instance: &WorkflowInstance, step: &Step) -> bool {
        step.depends_on.iter().all(|dep| {
            instance
                .step_instances
                .get(dep)
                .map(|s| s.status.satisfies_dependency())
                .unwrap_or(false)
        })
    }

    async fn start_step(
        &self,
        instance: &mut WorkflowInstance,
        step: &Step,
        definition: &WorkflowDefinition,
    ) -> Result<()> {
        let now = self.clock.epoch_ms();
        {
            let state = instance.step_instances.entry(step.id.clone()).or_default();
            state.status = StepStatus::Running;
            state.started_at_ms = Some(now);
            state.attempts += 1;
        }
        self.bus.publish(Event::WorkflowStepStarted { instance_id: instance.id, step_id: step.id.clone() });

        match &step.kind {
            StepKind::Job { command, pattern, required_capabilities, priority, payload_expression, timeout_ms } => {
                let payload = match payload_expression {
                    Some(expr) => {
                        let vars = instance.variables.clone();
                        let value = expr::evaluate(expr, &vars)
                            .map_err(|e| OrbitError::invalid_argument(format!("payload_expression: {e}")))?;
                        serde_json::to_vec(&value).unwrap_or_default()
                    }
                    None => Vec::new(),
                };
                let mut request = JobRequest::new(command.clone());
                request.pattern = pattern.clone();
                request.required_capabilities = required_capabilities.clone();
                request.priority = *priority;
                request.payload = payload;
                request.timeout_ms = *timeout_ms;
                let job = self.dispatcher.submit(request).await?;
                instance.step_instances.entry(step.id.clone()).or_default().job_ids.push(job.id);
            }
            StepKind::Delay { .. } => {
                // Completion is evaluated on the next `advance` that observes
                // the elapsed duration; see `delay_elapsed`.
            }
            StepKind::Parallel { .. } => {
                // Branch steps are ordinary DAG nodes whose `dependsOn`
                // includes this step id; nothing further to do but let them
                // become ready on the next scheduling pass.
                self.complete_step(instance, &step.id, StepStatus::Completed, None, None);
            }
            StepKind::Conditional { expression, then_steps, else_steps } => {
                let vars = instance.variables.clone();
                let truthy = expr::evaluate_bool(expression, &vars).unwrap_or(false);
                let (taken, skipped) = if truthy { (then_steps, else_steps) } else { (else_steps, then_steps) };
                let _ = taken;
                for id in skipped {
                    self.force_skip(instance, id);
                }
                let output = serde_json::json!(if truthy { "then" } else { "else" });
                self.complete_step(instance, &step.id, StepStatus::Completed, Some(output), None);
            }
            StepKind::ForEach { collection_expression, item_variable: _, body, .. } => {
                // `maxConcurrency` is advisory for the reference engine: every
                // item's job is submitted up front and the dispatcher's own
                // ready-set ordering throttles actual concurrency.
                let vars = instance.variables.clone();
                let collection = expr::evaluate(collection_expression, &vars)
                    .map_err(|e| OrbitError::invalid_argument(format!("collection_expression: {e}")))?;
                let items = collection.as_array().cloned().unwrap_or_default();
                let body_job = body.first().and_then(|id| definition.step(id)).and_then(|s| match &s.kind {
                    StepKind::Job { command, pattern, required_capabilities, priority, timeout_ms, .. } => {
                        Some((command.clone(), pattern.clone(), required_capabilities.clone(), *priority, *timeout_ms))
                    }
                    _ => None,
                });

                let mut job_ids = Vec::new();
                if let Some((command, pattern, required_capabilities, priority, timeout_ms)) = body_job {
                    for item in &items {
                        let mut request = JobRequest::new(command.clone());
                        request.pattern = pattern.clone();
                        request.required_capabilities = required_capabilities.clone();
                        request.priority = priority;
                        request.timeout_ms = timeout_ms;
                        request.payload = serde_json::to_vec(item).unwrap_or_default();
                        let job = self.dispatcher.submit(request).await?;
                        job_ids.push(job.id);
                    }
                }
                if job_ids.is_empty() {
                    self.complete_step(instance, &step.id, StepStatus::Completed, Some(serde_json::json!([])), None);
                } else {
                    instance.step_instances.entry(step.id.clone()).or_default().job_ids = job_ids;
                }
            }
            StepKind::WaitForEvent { event_type, correlation_key, .. } => {
                instance.step_instances.entry(step.id.clone()).or_default().status = StepStatus::WaitingForEvent;
                instance.step_instances.entry(step.id.clone()).or_default().waiting_on =
                    Some((event_type.clone(), correlation_key.clone()));
                if !self.other_step_running(instance, &step.id) {
                    instance.status = InstanceStatus::Paused;
                    self.bus.publish(Event::WorkflowInstancePaused { instance_id: instance.id });
                }
            }
            StepKind::SubWorkflow { .. } => {
                // Sub-workflow dispatch is left to the host orchestrator
                // (spec §4.3 names the step but leaves fan-out to the caller);
                // record it as immediately complete so the parent DAG proceeds.
                self.complete_step(instance, &step.id, StepStatus::Completed, None, None);
            }
            StepKind::Notify { target, message_expression } => {
                let message = match message_expression {
                    Some(expr) => {
                        let vars = instance.variables.clone();
                        expr::evaluate(expr, &vars).ok().map(|v| v.to_string()).unwrap_or_default()
                    }
                    None => String::new(),
                };
                // Delivering the notification to `target` is a transport
                // concern left to the host (spec §4.3 names the step, not a
                // delivery mechanism); the engine records it as the step's
                // output so the host can act on it.
                let output = serde_json::json!({ "target": target, "message": message });
                self.complete_step(instance, &step.id, StepStatus::Completed, Some(output), None);
            }
            StepKind::Approval { prompt, options, .. } => {
                let decision = Decision::new(
                    instance.id,
                    step.id.clone(),
                    prompt.clone(),
                    options.iter().map(|o| DecisionOption::new(o.clone())).collect(),
                    now,
                );
                self.store.put_decision(decision).await?;
                instance.step_instances.entry(step.id.clone()).or_default().status = StepStatus::WaitingForEvent;
                instance.step_instances.entry(step.id.clone()).or_default().waiting_on =
                    Some(("approval".to_string(), Some(step.id.to_string())));
                if !self.other_step_running(instance, &step.id) {
                    instance.status = InstanceStatus::Paused;
                    self.bus.publish(Event::WorkflowInstancePaused { instance_id: instance.id });
                }
            }
        }
        Ok(())
    }

    fn other_step_running(&self, instance: &WorkflowInstance, except: &StepId) -> bool {
        instance
            .step_instances
            .iter()
            .any(|(id, s)| id != except && s.status == StepStatus::Running)
    }

    fn force_skip(&self, instance: &mut WorkflowInstance, step_id: &StepId) {
        let already_terminal = instance
            .step_instances
            .get(step_id)
            .map(|s| s.status != StepStatus::Pending)
            .unwrap_or(true);
        if already_terminal {
            return;
        }
        self.complete_step(instance, step_id, StepStatus::Skipped, None, None);
    }

    fn complete_step(
        &self,
        instance: &mut WorkflowInstance,
        step_id: &StepId,
        status: StepStatus,
        output: Option<serde_json::Value>,
        error: Option<String>,
    ) {
        let now = self.clock.epoch_ms();
        if let Some(state) = instance.step_instances.get_mut(step_id) {
            state.status = status;
            state.completed_at_ms = Some(now);
            state.output = output;
            state.error = error;
        }
        match status {
            StepStatus::Completed => {
                self.bus.publish(Event::WorkflowStepCompleted { instance_id: instance.id, step_id: step_id.clone() });
            }
            StepStatus::Skipped => {
                self.bus.publish(Event::WorkflowStepSkipped { instance_id: instance.id, step_id: step_id.clone() });
            }
            StepStatus::Failed => {
                let message = instance
                    .step_instances
                    .get(step_id)
                    .and_then(|s| s.error.clone())
                    .unwrap_or_default();
                self.bus.publish(Event::WorkflowStepFailed {
                    instance_id: instance.id,
                    step_id: step_id.clone(),
                    error: message,
                });
            }
            _ => {}
        }
    }

    /// Called when a job submitted on behalf of a `Job` or `ForEach` step
    /// reaches a terminal status (spec §4.3's implicit dependency on the
    /// dispatcher's lifecycle).
    pub async fn on_job_terminal(&self, job_id: &JobId) -> Result<()> {
        let job = self.dispatcher.get(job_id).await?;
        if !job.status.is_terminal() {
            return Ok(());
        }
        let Some((instance_id, step_id)) = self.find_owning_step(job_id).await? else { return Ok(()) };
        let mut instance = self.get_instance(&instance_id).await?;
        let definition = self.get_definition(&instance.workflow_id).await?;
        let Some(step) = definition.step(&step_id) else { return Ok(()) };

        let remaining: Vec<JobId> = instance
            .step_instances
            .get(&step_id)
            .map(|s| s.job_ids.iter().copied().filter(|id| id != job_id).collect())
            .unwrap_or_default();

        if job.status == JobStatus::Completed {
            if remaining.is_empty() {
                let output = job.result.as_deref().and_then(|b| serde_json::from_slice(b).ok());
                self.complete_step(&mut instance, &step_id, StepStatus::Completed, output, None);
                if let Some(var) = &step.output_variable {
                    if let Some(value) = instance.step_instances.get(&step_id).and_then(|s| s.output.clone()) {
                        instance.variables.insert(var.clone(), value);
                    }
                }
            } else {
                instance.step_instances.entry(step_id.clone()).or_default().job_ids = remaining;
            }
        } else {
            let message = job.error.as_ref().map(|e| e.message.clone()).unwrap_or_else(|| job.status.to_string());
            if step.continue_on_error {
                self.complete_step(&mut instance, &step_id, StepStatus::Skipped, None, Some(message));
            } else {
                self.complete_step(&mut instance, &step_id, StepStatus::Failed, None, Some(message));
                self.fail_instance(&mut instance, &step_id).await?;
                self.store.put_workflow_instance(instance).await?;
                return Ok(());
            }
        }

        self.advance(&mut instance, &definition).await?;
        self.store.put_workflow_instance(instance).await?;
        Ok(())
    }

    async fn find_owning_step(&self, job_id: &JobId) -> Result<Option<(InstanceId, StepId)>> {
        let instances = self.store.list_workflow_instances(Default::default()).await?;
        for instance in instances {
            for (step_id, state) in &instance.step_instances {
                if state.job_ids.contains(job_id) {
                    return Ok(Some((instance.id, step_id.clone())));
                }
            }
        }
        Ok(None)
    }

    async fn fail_instance(&self, instance: &mut WorkflowInstance, failed_step: &StepId) -> Result<()> {
        use orbitmesh_core::workflow::ErrorHandlingPolicy;
        let definition = self.get_definition(&instance.workflow_id).await?;
        match definition.error_handling {
            ErrorHandlingPolicy::StopOnFirstError | ErrorHandlingPolicy::ContinueAndAggregate => {
                instance.status = InstanceStatus::Failed;
                instance.completed_at_ms = Some(self.clock.epoch_ms());
                self.bus.publish(Event::WorkflowInstanceFailed {
                    instance_id: instance.id,
                    error: format!("step {failed_step} failed"),
                });
            }
            ErrorHandlingPolicy::Compensate => {
                // Best-effort: no compensation action is modeled on `Step`
                // yet, so this degrades to the stop-on-first-error behavior.
                instance.status = InstanceStatus::Failed;
                instance.completed_at_ms = Some(self.clock.epoch_ms());
                self.bus.publish(Event::WorkflowInstanceFailed {
                    instance_id: instance.id,
                    error: format!("step {failed_step} failed (compensation not executed)"),
                });
            }
        }
        Ok(())
    }

    fn maybe_finish(&self, instance: &mut WorkflowInstance, definition: &WorkflowDefinition) {
        if instance.status.is_terminal() {
            return;
        }
        let all_done = definition
            .steps
            .iter()
            .all(|s| instance.step_instances.get(&s.id).map(|st| st.status.is_terminal()).unwrap_or(false));
        if all_done && instance.status != InstanceStatus::Paused {
            instance.status = InstanceStatus::Completed;
            instance.completed_at_ms = Some(self.clock.epoch_ms());
            self.bus.publish(Event::WorkflowInstanceCompleted { instance_id: instance.id });
        } else if all_done {
            // Every step is terminal but the instance is parked `Paused`
            // (a `WaitForEvent`/`Approval` that never got signaled before
            // the rest of the DAG finished); leave it for `signal` to close out.
        }
    }

    /// Wake matching `WaitForEvent`/`Approval` steps and re-evaluate
    /// readiness (spec §4.3 "Pause-resume").
    pub async fn signal(
        &self,
        instance_id: &InstanceId,
        event_type: &str,
        correlation_key: Option<&str>,
        payload: serde_json::Value,
    ) -> Result<()> {
        let mut instance = self.get_instance(instance_id).await?;
        let definition = self.get_definition(&instance.workflow_id).await?;

        let matching: Vec<StepId> = instance
            .step_instances
            .iter()
            .filter(|(_, s)| s.status == StepStatus::WaitingForEvent)
            .filter(|(_, s)| {
                s.waiting_on
                    .as_ref()
                    .map(|(ty, key)| {
                        ty == event_type && key.as_deref().map(|k| Some(k) == correlation_key).unwrap_or(true)
                    })
                    .unwrap_or(false)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for step_id in &matching {
            if let Some(step) = definition.step(step_id) {
                if let Some(var) = &step.output_variable {
                    instance.variables.insert(var.clone(), payload.clone());
                }
            }
            self.complete_step(&mut instance, step_id, StepStatus::Completed, Some(payload.clone()), None);
        }

        if !matching.is_empty() {
            self.bus.publish(Event::WorkflowSignalReceived { instance_id: instance.id, event_type: event_type.to_string() });
            if instance.status == InstanceStatus::Paused {
                instance.status = InstanceStatus::Running;
                self.bus.publish(Event::WorkflowInstanceResumed { instance_id: instance.id });
            }
            self.advance(&mut instance, &definition).await?;
        }
        self.store.put_workflow_instance(instance).await?;
        Ok(())
    }

    /// Resolve an `Approval` step's [`Decision`] by label; equivalent to
    /// `signal` with the decision's correlation key.
    pub async fn resolve_decision(&self, decision_id: &DecisionId, chosen_label: &str) -> Result<()> {
        let mut decision = self
            .store
            .get_decision(decision_id)
            .await?
            .ok_or_else(|| OrbitError::not_found(EntityKind::Decision, decision_id.to_string()))?;
        decision.resolved_at_ms = Some(self.clock.epoch_ms());
        decision.chosen_label = Some(chosen_label.to_string());
        let (instance_id, step_id) = (decision.instance_id, decision.step_id.clone());
        self.store.put_decision(decision).await?;
        self.signal(&instance_id, "approval", Some(&step_id.to_string()), serde_json::json!(chosen_label)).await
    }

    pub async fn pause(&self, instance_id: &InstanceId) -> Result<()> {
        let mut instance = self.get_instance(instance_id).await?;
        if instance.status == InstanceStatus::Running {
            instance.status = InstanceStatus::Paused;
            self.store.put_workflow_instance(instance.clone()).await?;
            self.bus.publish(Event::WorkflowInstancePaused { instance_id: instance.id });
        }
        Ok(())
    }

    pub async fn resume(&self, instance_id: &InstanceId) -> Result<()> {
        let mut instance = self.get_instance(instance_id).await?;
        if instance.status == InstanceStatus::Paused {
            instance.status = InstanceStatus::Running;
            let definition = self.get_definition(&instance.workflow_id).await?;
            self.bus.publish(Event::WorkflowInstanceResumed { instance_id: instance.id });
            self.advance(&mut instance, &definition).await?;
            self.store.put_workflow_instance(instance).await?;
        }
        Ok(())
    }

    pub async fn cancel(&self, instance_id: &InstanceId) -> Result<()> {
        let mut instance = self.get_instance(instance_id).await?;
        if instance.status.is_terminal() {
            return Ok(());
        }
        instance.status = InstanceStatus::Cancelled;
        instance.completed_at_ms = Some(self.clock.epoch_ms());
        for state in instance.step_instances.values_mut() {
            if !state.status.is_terminal() {
                state.status = StepStatus::Cancelled;
                state.completed_at_ms = Some(self.clock.epoch_ms());
            }
        }
        self.store.put_workflow_instance(instance.clone()).await?;
        self.bus.publish(Event::WorkflowInstanceCancelled { instance_id: instance.id });
        Ok(())
    }
}

/// Every `dependsOn` reference resolves to a step in the same definition and
/// the dependency graph has no cycles (spec invariant 5, implied structural
/// requirement for a well-formed DAG).
fn validate_dag(definition: &WorkflowDefinition) -> Result<()> {
    let ids: std::collections::HashSet<&StepId> = definition.steps.iter().map(|s| &s.id).collect();
    for step in &definition.steps {
        for dep in &step.depends_on {
            if !ids.contains(dep) {
                return Err(OrbitError::invalid_argument(format!(
                    "step {} depends on unknown step {}",
                    step.id, dep
                )));
            }
        }
    }

    let mut visiting = std::collections::HashSet::new();
    let mut visited = std::collections::HashSet::new();
    for step in &definition.steps {
        if !visited.contains(&step.id) {
            visit(definition, &step.id, &mut visiting, &mut visited)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    definition: &'a WorkflowDefinition,
    id: &'a StepId,
    visiting: &mut std::collections::HashSet<&'a StepId>,
    visited: &mut std::collections::HashSet<&'a StepId>,
) -> Result<()> {
    if visited.contains(id) {
        return Ok(());
    }
    if !visiting.insert(id) {
        return Err(OrbitError::invalid_argument(format!("workflow definition has a cycle at step {id}")));
    }
    if let Some(step) = definition.step(id) {
        for dep in &step.depends_on {
            visit(definition, dep, visiting, visited)?;
        }
    }
    visiting.remove(id);
    visited.insert(id);
    Ok(())
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
