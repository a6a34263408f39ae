/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use chrono::Utc;
use entity::project::ProjectType;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::input::check_api_key;
use super::types::*;

/// Declarative project bootstrap. Lets a deployment pin its projects and
/// API keys in a version-controlled file instead of manual admin actions.
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfiguration {
    #[serde(default)]
    pub projects: Vec<ProjectState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectState {
    pub name: String,
    #[serde(default)]
    pub versioned: bool,
    pub minidump_api_key: String,
    pub symbol_api_key: String,
}

impl StateConfiguration {
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path))?;
        serde_json::from_str(&contents).context("Failed to parse state file")
    }

    pub fn validate(&self) -> Result<()> {
        for project in &self.projects {
            if project.name.is_empty() {
                anyhow::bail!("project name cannot be empty");
            }
            check_api_key(&project.minidump_api_key)
                .map_err(|e| anyhow::anyhow!("project {}: {}", project.name, e))?;
            check_api_key(&project.symbol_api_key)
                .map_err(|e| anyhow::anyhow!("project {}: {}", project.name, e))?;
        }
        Ok(())
    }
}

pub async fn apply_state_file(state: Arc<ServerState>, path: &str) -> Result<()> {
    let config = StateConfiguration::from_file(path)?;
    config.validate()?;
    apply(state, config).await
}

/// Upsert every declared project by name.
pub async fn apply(state: Arc<ServerState>, config: StateConfiguration) -> Result<()> {
    for declared in config.projects {
        let project_type = if declared.versioned {
            ProjectType::Versioned
        } else {
            ProjectType::Simple
        };

        let existing = EProject::find()
            .filter(CProject::Name.eq(declared.name.clone()))
            .one(&state.db)
            .await
            .context("Failed to query project")?;

        match existing {
            Some(project) => {
                let changed = project.project_type != project_type
                    || project.minidump_api_key != declared.minidump_api_key
                    || project.symbol_api_key != declared.symbol_api_key;

                if changed {
                    info!(project = %declared.name, "updating project from state file");
                    let mut active = project.into_active_model();
                    active.project_type = Set(project_type);
                    active.minidump_api_key = Set(declared.minidump_api_key);
                    active.symbol_api_key = Set(declared.symbol_api_key);
                    active
                        .update(&state.db)
                        .await
                        .context("Failed to update project")?;
                }
            }
            None => {
                info!(project = %declared.name, "creating project from state file");
                AProject {
                    id: Set(Uuid::new_v4()),
                    name: Set(declared.name),
                    project_type: Set(project_type),
                    minidump_api_key: Set(declared.minidump_api_key),
                    symbol_api_key: Set(declared.symbol_api_key),
                    created_at: Set(Utc::now().naive_utc()),
                }
                .insert(&state.db)
                .await
                .context("Failed to insert project")?;
            }
        }
    }

    Ok(())
}
