use serde::Deserialize;

/// What a watch rule does when it fires again while its previous reaction is
/// still running.
///
/// - `Queue`: remember the trigger and run the reaction once more as soon as
///   the current one finishes (default). Further triggers collapse into that
///   single queued run.
/// - `Skip`: drop the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Skip,
}
