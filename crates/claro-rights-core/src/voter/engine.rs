//! Resource voter.
//!
//! Decides whether a requester may act on resource nodes. Two overrides are
//! tried before any mask is read:
//!
//! 1. the manager of the single workspace all nodes belong to may do anything;
//! 2. the creator of every node may do anything, unless impersonating a
//!    workspace role.
//!
//! Otherwise each node's granted mask is checked against the bit of the
//! requested action. Copy and move are built from creation checks at the
//! destination plus the copy (and, for move, delete) action checks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::VoterConfig;
use crate::decoder::MaskDecoderRegistry;
use crate::error::{Error, Result};
use crate::node::{ResourceNode, Workspace};
use crate::repository::RightsRepository;
use crate::requester::{Requester, manager_role_name};

use super::types::{AccessError, Operation, Subject, Vote, requires_collection};

/// Resource voter over an injected rights repository and decoder registry.
pub struct ResourceVoter<R> {
    rights: R,
    decoders: Arc<MaskDecoderRegistry>,
    config: VoterConfig,
}

impl<R: RightsRepository> ResourceVoter<R> {
    /// Create a voter with the default override rules.
    pub fn new(rights: R, decoders: Arc<MaskDecoderRegistry>) -> Self {
        Self::with_config(rights, decoders, VoterConfig::default())
    }

    pub const fn with_config(
        rights: R,
        decoders: Arc<MaskDecoderRegistry>,
        config: VoterConfig,
    ) -> Self {
        Self {
            rights,
            decoders,
            config,
        }
    }

    /// Vote on `subject`.
    ///
    /// Collections get their errors stored on them. A create/move/copy
    /// attribute on a single node is a caller error, not a denial.
    pub async fn vote(&self, requester: &Requester, subject: Subject<'_>) -> Result<Vote> {
        match subject {
            Subject::Collection(collection) => {
                let errors = match collection.operation() {
                    Operation::Action(action) => {
                        self.check_action(action, collection.nodes(), requester)
                            .await?
                    }
                    Operation::Create { type_name, parent } => {
                        self.check_creation(type_name, parent, requester, parent.workspace())
                            .await?
                    }
                    Operation::Move { parent } => {
                        self.check_move(parent, collection.nodes(), requester)
                            .await?
                    }
                    Operation::Copy { parent } => {
                        self.check_copy(parent, collection.nodes(), requester)
                            .await?
                    }
                };
                let vote = decision(&errors);
                info!(
                    operation = collection.operation().name(),
                    nodes = collection.nodes().len(),
                    errors = errors.len(),
                    ?vote,
                    "Collection vote"
                );
                collection.set_errors(errors);
                Ok(vote)
            }
            Subject::Node { node, attribute } => {
                if requires_collection(attribute) {
                    return Err(Error::CollectionRequired {
                        action: attribute.to_lowercase(),
                    });
                }
                let errors = self
                    .check_action(attribute, std::slice::from_ref(node), requester)
                    .await?;
                let vote = decision(&errors);
                info!(node = %node.id(), attribute, ?vote, "Node vote");
                Ok(vote)
            }
            Subject::Unsupported => Ok(Vote::Abstain),
        }
    }

    /// Check `action` on every node of a batch.
    ///
    /// Returns one error per denied node, in input order. A missing decoder
    /// stops the batch with a single [`AccessError::UnknownPermission`].
    pub async fn check_action(
        &self,
        action: &str,
        nodes: &[ResourceNode],
        requester: &Requester,
    ) -> Result<Vec<AccessError>> {
        let Some(first) = nodes.first() else {
            return Ok(Vec::new());
        };
        let action = action.to_lowercase();

        let workspace = first.workspace();
        let same_workspace = nodes.iter().all(|node| node.workspace() == workspace);
        if same_workspace && self.is_workspace_manager(workspace, requester) {
            debug!(workspace = %workspace.guid, action, "Workspace manager override");
            return Ok(Vec::new());
        }

        if self.is_creator_of_all(nodes, requester) {
            debug!(action, nodes = nodes.len(), "Creator override");
            return Ok(Vec::new());
        }

        let mut errors = Vec::new();
        for node in nodes {
            let type_name = &node.resource_type().name;
            let Some(decoder) = self.decoders.decoder(type_name, &action) else {
                warn!(action, resource_type = %type_name, "No mask decoder for action");
                return Ok(vec![AccessError::UnknownPermission {
                    action,
                    type_name: type_name.clone(),
                }]);
            };

            let mask = self.rights.max_granted_mask(&requester.roles, node).await?;
            if !mask.grants(decoder.bit) {
                debug!(node = %node.id(), action, mask = %mask, bit = %decoder.bit, "Action denied");
                errors.push(AccessError::ActionDenied {
                    action: action.clone(),
                    path: node.path_for_display(),
                });
            }
        }
        Ok(errors)
    }

    /// Check that a resource of `type_name` may be created under `target`.
    ///
    /// The manager of `workspace` may create anything.
    pub async fn check_creation(
        &self,
        type_name: &str,
        target: &ResourceNode,
        requester: &Requester,
        workspace: &Workspace,
    ) -> Result<Vec<AccessError>> {
        if self.is_workspace_manager(workspace, requester) {
            debug!(workspace = %workspace.guid, type_name, "Workspace manager creation override");
            return Ok(Vec::new());
        }

        let creatable = self
            .rights
            .creatable_type_names(&requester.roles, target)
            .await?;
        if creatable.contains(type_name) {
            return Ok(Vec::new());
        }

        debug!(node = %target.id(), type_name, "Creation denied");
        Ok(vec![AccessError::CreationWrongType {
            type_name: type_name.to_string(),
            path: target.path_for_display(),
        }])
    }

    /// Check a copy of `nodes` under `parent`: creation of the nodes' types
    /// at `parent`, then the copy action on the nodes.
    pub async fn check_copy(
        &self,
        parent: &ResourceNode,
        nodes: &[ResourceNode],
        requester: &Requester,
    ) -> Result<Vec<AccessError>> {
        let mut errors = self.check_creations_at(parent, nodes, requester).await?;
        errors.extend(self.check_action("copy", nodes, requester).await?);
        Ok(errors)
    }

    /// Check a move of `nodes` under `parent`: creation at `parent`, copy,
    /// and delete at the source. Every failing check is reported.
    pub async fn check_move(
        &self,
        parent: &ResourceNode,
        nodes: &[ResourceNode],
        requester: &Requester,
    ) -> Result<Vec<AccessError>> {
        // the copy check already covers creation at the destination
        let mut errors = self.check_copy(parent, nodes, requester).await?;
        errors.extend(self.check_action("delete", nodes, requester).await?);
        Ok(errors)
    }

    /// Creation check under `parent` for each distinct type among `nodes`,
    /// in first-seen order, against the destination workspace.
    async fn check_creations_at(
        &self,
        parent: &ResourceNode,
        nodes: &[ResourceNode],
        requester: &Requester,
    ) -> Result<Vec<AccessError>> {
        let mut checked: Vec<&str> = Vec::new();
        let mut errors = Vec::new();
        for node in nodes {
            let type_name = node.resource_type().name.as_str();
            if checked.contains(&type_name) {
                continue;
            }
            checked.push(type_name);
            errors.extend(
                self.check_creation(type_name, parent, requester, parent.workspace())
                    .await?,
            );
        }
        Ok(errors)
    }

    fn is_workspace_manager(&self, workspace: &Workspace, requester: &Requester) -> bool {
        requester.has_role(&manager_role_name(
            &self.config.manager_role_prefix,
            workspace,
        ))
    }

    fn is_creator_of_all(&self, nodes: &[ResourceNode], requester: &Requester) -> bool {
        self.config.creator_override
            && !requester.has_role(&self.config.usurpation_role)
            && nodes.iter().all(|node| requester.is(node.creator()))
    }
}

fn decision(errors: &[AccessError]) -> Vote {
    if errors.is_empty() {
        Vote::Granted
    } else {
        Vote::Denied
    }
}
