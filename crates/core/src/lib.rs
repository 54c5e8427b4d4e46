//! Core engine for semantic file organization.
//!
//! The stages form a pipeline: [`scanner`] collects candidate files,
//! [`extractor`] turns each into a [`models::FileSignature`], [`similarity`]
//! scores pairs, [`cluster`] groups them into projects, [`structure`] shapes
//! each project into a folder tree, [`planner`] turns trees into concrete
//! move operations, and [`executor`] applies or reverts them. [`pipeline`]
//! wires the whole thing together behind [`pipeline::Organizer`].

pub mod cluster;
pub mod config;
pub mod embeddings;
pub mod executor;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod planner;
pub mod scanner;
pub mod search;
pub mod similarity;
pub mod structure;

pub use models::{
    Conflict, ExecutionReport, FileOperation, FileSignature, FileType, OperationKind,
    OrganizationPlan, OrganizeError, ProjectCluster, ProjectStructure, ProjectType,
};
pub use pipeline::Organizer;
