//! Pull request to graph mirroring pipeline.
//!
//! Fetches the pull request, its head and base commits and the head tree,
//! then writes them as nodes and relationships:
//!
//! - (:PullRequest)-[:HEAD]->(:Commit)
//! - (:PullRequest)-[:BASE]->(:Commit)
//! - (:Commit)-[:CONTAINS {name: "/"}]->(:Tree)
//! - (:Tree)-[:CONTAINS {name}]->(:Tree | :Blob)
//!
//! Every step is awaited in order and every write is an upsert. There is no
//! transaction around the run: an error stops it where it is, and since each
//! edge is written right after its endpoints, the partial graph never has a
//! dangling edge. Running again re-matches what exists and writes the rest.

mod walk;

use serde::Serialize;
use tracing::{info, warn};

use prmirror_core::{EntityKind, MirrorConfig, MirrorResult, Properties, RepoRef, WalkPolicy};
use prmirror_github::GitObjectSource;

use crate::writer::{MirrorWriter, NodeRef, StoredEntity};

/// Relationship from a pull request to its head commit.
pub const HEAD: &str = "HEAD";
/// Relationship from a pull request to its base commit.
pub const BASE: &str = "BASE";
/// Containment relationship, named by path segment.
pub const CONTAINS: &str = "CONTAINS";
/// `name` of the edge from the head commit to its root tree.
pub const ROOT_NAME: &str = "/";

/// Result of a mirror run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MirrorReport {
    pub entities_upserted: usize,
    pub relationships_upserted: usize,
    /// Relationship writes that found a missing endpoint.
    pub relationships_skipped: usize,
    pub trees_visited: usize,
    pub blobs_visited: usize,
    /// Decoded content of the output blob.
    pub output: Option<String>,
}

/// Mirrors one pull request from a source into a writer.
pub struct Mirror<'a, S: ?Sized, W: ?Sized> {
    source: &'a S,
    writer: &'a W,
    repo: RepoRef,
    pull_number: u64,
    walk: WalkPolicy,
}

impl<'a, S, W> Mirror<'a, S, W>
where
    S: GitObjectSource + ?Sized,
    W: MirrorWriter + ?Sized,
{
    pub fn new(source: &'a S, writer: &'a W, config: &MirrorConfig) -> Self {
        Self {
            source,
            writer,
            repo: config.repo.clone(),
            pull_number: config.pull_number,
            walk: config.walk.clone(),
        }
    }

    /// Run the full pipeline once.
    pub async fn run(&self) -> MirrorResult<MirrorReport> {
        info!(repo = %self.repo, pull = self.pull_number, "Starting mirror");
        let mut report = MirrorReport::default();

        let pr = self.source.fetch_pull_request(&self.repo, self.pull_number).await?;
        let pr_node = self.entity(&mut report, EntityKind::PullRequest, pr.attributes()).await?;
        info!(node_id = %pr.node_id, title = %pr.title, "Pull request mirrored");

        // Head side is complete before the base commit is fetched.
        let head = self.source.fetch_commit(&self.repo, &pr.head_sha).await?;
        let head_node = self.entity(&mut report, EntityKind::Commit, head.attributes()).await?;
        self.link(&mut report, HEAD, Properties::new(), &pr_node, &head_node).await?;

        let base = self.source.fetch_commit(&self.repo, &pr.base_sha).await?;
        let base_node = self.entity(&mut report, EntityKind::Commit, base.attributes()).await?;
        self.link(&mut report, BASE, Properties::new(), &pr_node, &base_node).await?;
        info!(head = %head.sha, base = %base.sha, "Commits mirrored");

        let root = self.source.fetch_tree(&self.repo, &head.tree_sha).await?;
        let root_node = self.entity(&mut report, EntityKind::Tree, root.attributes()).await?;
        self.link(&mut report, CONTAINS, named(ROOT_NAME), &head_node, &root_node).await?;
        report.trees_visited += 1;

        self.walk_tree(&mut report, root, root_node).await?;

        info!(
            entities = report.entities_upserted,
            relationships = report.relationships_upserted,
            trees = report.trees_visited,
            blobs = report.blobs_visited,
            "Mirror complete"
        );
        Ok(report)
    }

    async fn entity(
        &self,
        report: &mut MirrorReport,
        kind: EntityKind,
        attributes: Properties,
    ) -> MirrorResult<StoredEntity> {
        let stored = self
            .writer
            .upsert_entity(kind.label(), &attributes, kind.merge_key())
            .await?;
        report.entities_upserted += 1;
        Ok(stored)
    }

    async fn link(
        &self,
        report: &mut MirrorReport,
        rel_type: &str,
        properties: Properties,
        from: &StoredEntity,
        to: &StoredEntity,
    ) -> MirrorResult<()> {
        let (from, to): (NodeRef, NodeRef) = (from.node_ref(), to.node_ref());
        match self.writer.upsert_relationship(rel_type, &properties, &from, &to).await? {
            Some(_) => report.relationships_upserted += 1,
            None => {
                warn!(rel_type, %from, %to, "Relationship skipped");
                report.relationships_skipped += 1;
            }
        }
        Ok(())
    }
}

fn named(name: &str) -> Properties {
    Properties::from([("name".to_string(), name.to_string())])
}
