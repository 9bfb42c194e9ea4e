//! Upload orchestration.
//!
//! Overwrite mode walks `ParseDescriptor -> CheckExists -> (Delete) ->
//! Upload -> Done`; plain mode goes straight to `Upload`. Each step starts
//! only after the previous one settled and the first failure ends the run.

use std::fmt;
use std::path::PathBuf;

use log::{debug, info};

use crate::api::{ComponentOperations, PublicFlag};
use crate::descriptor::{ComponentIdentity, IdentityOverride, resolve_identity};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub file: PathBuf,
    pub instance: String,
    pub overwrite: bool,
    pub public: PublicFlag,
    pub identity: IdentityOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    ParseDescriptor,
    CheckExists,
    Delete,
    Upload,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStep::ParseDescriptor => "reading the component descriptor",
            UploadStep::CheckExists => "checking for an existing component",
            UploadStep::Delete => "deleting the existing component",
            UploadStep::Upload => "uploading the component",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Only known in overwrite mode.
    pub identity: Option<ComponentIdentity>,
    /// A previous copy was deleted before uploading.
    pub replaced: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed while {step}: {source}")]
pub struct UploadFailure {
    pub step: UploadStep,
    /// The previous copy is already gone.
    pub deleted: bool,
    #[source]
    pub source: Error,
}

enum State {
    ParseDescriptor,
    CheckExists(ComponentIdentity),
    Delete(ComponentIdentity),
    Upload {
        identity: Option<ComponentIdentity>,
        replaced: bool,
    },
    Done(UploadReport),
}

pub async fn run(
    operations: &dyn ComponentOperations,
    plan: &UploadPlan,
) -> Result<UploadReport, UploadFailure> {
    let mut state = if plan.overwrite {
        State::ParseDescriptor
    } else {
        State::Upload {
            identity: None,
            replaced: false,
        }
    };

    loop {
        state = match state {
            State::ParseDescriptor => {
                let identity = resolve_identity(&plan.file, &plan.identity)
                    .map_err(|source| failure(UploadStep::ParseDescriptor, false, source))?;
                State::CheckExists(identity)
            }
            State::CheckExists(identity) => {
                let exists = operations
                    .exists(&plan.instance, &identity)
                    .await
                    .map_err(|source| failure(UploadStep::CheckExists, false, source))?;
                debug!("{} present on {}: {}", identity, plan.instance, exists);
                if exists {
                    State::Delete(identity)
                } else {
                    State::Upload {
                        identity: Some(identity),
                        replaced: false,
                    }
                }
            }
            State::Delete(identity) => {
                operations
                    .delete(&plan.instance, &identity)
                    .await
                    .map_err(|source| failure(UploadStep::Delete, false, source))?;
                info!("Removed previous {} from {}", identity, plan.instance);
                State::Upload {
                    identity: Some(identity),
                    replaced: true,
                }
            }
            State::Upload { identity, replaced } => {
                operations
                    .upload(&plan.instance, &plan.file, &plan.public)
                    .await
                    .map_err(|source| failure(UploadStep::Upload, replaced, source))?;
                State::Done(UploadReport { identity, replaced })
            }
            State::Done(report) => return Ok(report),
        };
    }
}

fn failure(step: UploadStep, deleted: bool, source: Error) -> UploadFailure {
    UploadFailure {
        step,
        deleted,
        source,
    }
}
