//! Runner executing one CLI command against a freshly built manager

use crate::cli::args::{Args, Command};
use crate::config::ManagerConfig;
use crate::error::Result;
use crate::logging::Logger;
use crate::manager::{RegistryManager, RegistrySnapshot};
use crate::registry::{Registry, Repository, Tag, TagStatus};
use std::sync::Arc;
use std::time::Duration;

pub struct Runner {
    args: Args,
    config: ManagerConfig,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args, base: ManagerConfig) -> Self {
        let config = args.apply_to(base);
        let output = Logger::new();
        Self {
            args,
            config,
            output,
        }
    }

    pub async fn run(&self) -> Result<()> {
        match &self.args.command {
            Command::Status { uri } => {
                let (manager, registry) = self.connect(uri).await?;
                let status = manager.check_status(&registry).await;
                self.output.summary_kv(
                    "Registry",
                    &[
                        ("URL", registry.api_url()),
                        ("IP", display_or(&registry.ip, "unknown")),
                        ("Status", status.to_string()),
                    ],
                );
            }
            Command::Repos { uri } => {
                let (manager, registry) = self.connect(uri).await?;
                let repositories = manager.repositories(&registry).await?;
                let names: Vec<String> = repositories.into_iter().map(|r| r.name).collect();
                self.output
                    .list(&format!("Repositories in {}", registry.name), &names);
            }
            Command::Tags { uri, repository } => {
                let (manager, registry) = self.connect(uri).await?;
                let repository = Repository::new(repository.as_str());
                let mut tags = manager.tags(registry, &repository).await?;
                tags.sort_by(|a, b| a.name.cmp(&b.name));
                let lines: Vec<String> = tags.iter().map(format_tag).collect();
                self.output
                    .list(&format!("Tags in {}", repository.name), &lines);
            }
            Command::Image {
                uri,
                repository,
                tag,
            } => {
                let (manager, registry) = self.connect(uri).await?;
                let repository = Repository::new(repository.as_str());
                let image = manager.image(&registry, &repository, tag).await?;

                self.output.summary_kv(
                    &format!("{}:{}", repository.name, tag),
                    &[
                        ("Schema version", image.schema_version.to_string()),
                        ("Architecture", display_or(&image.architecture, "unknown")),
                        ("Layers", image.layer_count().to_string()),
                        ("V1 sizes present", image.contains_v1_size.to_string()),
                    ],
                );
                let layers: Vec<String> = image
                    .fs_layers
                    .iter()
                    .map(|layer| {
                        format!(
                            "{}  {}",
                            layer.blob_sum,
                            display_or(&layer.size_str, "size unknown")
                        )
                    })
                    .collect();
                self.output.list("Layers", &layers);
                let history: Vec<String> = image
                    .history
                    .iter()
                    .map(|entry| {
                        let v1 = &entry.v1_compatibility;
                        format!(
                            "{}  {}  {}",
                            display_or(&v1.id_short, "-------"),
                            v1.size_str,
                            v1.container_config.cmd_clean.trim()
                        )
                    })
                    .collect();
                self.output.list("History", &history);
            }
            Command::Delete {
                uri,
                repository,
                tag,
            } => {
                let (manager, registry) = self.connect(uri).await?;
                let repository = Repository::new(repository.as_str());
                let digest = manager.delete_tag(&registry, &repository, tag).await?;
                self.output.summary_kv(
                    "Deleted",
                    &[
                        ("Tag", format!("{}:{}", repository.name, tag)),
                        ("Digest", digest),
                    ],
                );
            }
            Command::Watch { interval, .. } => self.watch(Duration::from_secs(*interval)).await?,
        }
        Ok(())
    }

    async fn connect(&self, uri: &str) -> Result<(RegistryManager, Arc<Registry>)> {
        let manager = RegistryManager::new(&self.config, self.output.clone())?;
        let registry = manager.add_registry(uri).await?;
        Ok((manager, registry))
    }

    async fn watch(&self, interval: Duration) -> Result<()> {
        let manager = RegistryManager::initialize(&self.config, self.output.clone()).await?;
        if manager.directory().is_empty() {
            self.output
                .warning("No registries configured; set REGISTRY_MANAGER_REGISTRIES or pass --registry");
            return Ok(());
        }

        loop {
            self.output.section("Registry refresh");
            for snapshot in manager.refresh_all().await {
                match snapshot {
                    Ok(snapshot) => self.print_snapshot(&snapshot),
                    Err(e) => self.output.error(&e.to_string()),
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    self.output.info("Stopping watch");
                    return Ok(());
                }
            }
        }
    }

    fn print_snapshot(&self, snapshot: &RegistrySnapshot) {
        let metadata = &snapshot.metadata;
        self.output.summary_kv(
            &snapshot.name,
            &[
                ("URL", snapshot.api_url.clone()),
                ("Status", metadata.status.to_string()),
                ("Repositories", metadata.repo_count.to_string()),
                ("Tags", metadata.tag_count.to_string()),
                ("Total size", display_or(&metadata.repo_total_size_str, "0 B")),
            ],
        );
        for repository in &snapshot.repositories {
            let mut lines: Vec<String> = repository.tags.iter().map(format_tag).collect();
            lines.sort();
            if let Some(error) = &repository.error {
                lines.push(format!("(tag list failed: {})", error));
            }
            self.output.list(&repository.repository.name, &lines);
        }
    }
}

fn format_tag(tag: &Tag) -> String {
    let mut line = format!(
        "{}  {}  {} layers  updated {}",
        tag.name, tag.size, tag.layers, tag.time_ago
    );
    if let TagStatus::Degraded(reason) = &tag.status {
        line.push_str(&format!("  [degraded: {}]", reason));
    }
    line
}

fn display_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
