use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheKey, CardCache};
use crate::card::CardTable;
use crate::cli::CliCommand;
use crate::client::{GraphqlClient, HttpGraphqlClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::CardFetcher;
use crate::render::Report;
use crate::report;

/// Ties one pipe's fetcher to the card cache and turns commands into reports.
pub struct Dashboard {
    fetcher: CardFetcher,
    cache: CardCache,
    key: CacheKey,
    completed_phases: Vec<String>,
    excluded_labels: Vec<String>,
}

impl Dashboard {
    pub fn new(config: &Config) -> Self {
        let token = config.token();
        let client = HttpGraphqlClient::new(config.api_url.clone(), token.clone(), config.retry);
        Self::with_client(config, token, Box::new(client))
    }

    pub fn with_client(config: &Config, token: String, client: Box<dyn GraphqlClient>) -> Self {
        Self {
            fetcher: CardFetcher::new(client),
            cache: CardCache::new(Duration::from_secs(config.cache_ttl)),
            key: CacheKey::new(token, config.pipe_id.clone(), config.page_size),
            completed_phases: config.completed_phases.clone(),
            excluded_labels: config.excluded_labels.clone(),
        }
    }

    /// The pipe's card table, served from cache while it is fresh.
    pub fn cards(&self) -> Result<Arc<CardTable>> {
        self.cache.get_or_fetch(&self.key, || {
            self.fetcher
                .fetch_all(&self.key.pipe_id, self.key.page_size)
        })
    }

    pub fn build_report(&self, command: &CliCommand) -> Result<Report> {
        if matches!(command, CliCommand::Progress { .. }) && self.completed_phases.is_empty() {
            return Err(Error::ConfigValidation(
                "progress needs completed_phases (config) or --completed-phase".to_string(),
            ));
        }

        let table = self.cards()?;
        debug!(?command, cards = table.len(), "building report");

        Ok(match command {
            CliCommand::Cards { phases } => {
                let filtered = report::filter_by_phases(&table, phases);
                Report::Cards(report::newest_first(&filtered).into_iter().cloned().collect())
            }
            CliCommand::Summary => Report::Summary(report::summary(&table)),
            CliCommand::Phases => Report::Phases(report::cards_per_phase(&table)),
            CliCommand::Timeline => Report::Timeline(report::created_per_day(&table)),
            CliCommand::Modules => Report::Modules(report::modules(&table, &self.excluded_labels)),
            CliCommand::Progress { module } => Report::Progress {
                progress: report::module_progress(&table, module, &self.completed_phases),
                phases: report::module_phase_distribution(&table, module),
            },
        })
    }
}
