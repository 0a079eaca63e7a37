mod orchestrator;
mod outcome;
mod stages;

pub use {
    orchestrator::{Pipeline, run_invocation},
    outcome::{NotificationKind, PipelineOutcome},
    stages::{
        DependencyPreflight, FocusProbe, FocusedWindow, InstanceControl, Notifier, Recorder,
        TextInserter, TranscriptLog, TranscriptionEngine, UsageLogger,
    },
};
