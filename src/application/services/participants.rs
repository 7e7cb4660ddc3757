//! Participant-list provider
//!
//! Reads campaign exports from a data directory and yields the deduplicated
//! participant list for a campaign selection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::application::{
    ApplicationError, ApplicationResult, CampaignFileResultExt, IoResultExt,
};
use crate::domain::{Campaign, CampaignSelection, Participant};
use crate::infrastructure::traits::FileSystem;

/// One exported campaign: metadata plus its registered participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignFile {
    pub campaign: Campaign,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// Participants for a campaign selection.
#[derive(Debug, Clone, Default)]
pub struct ParticipantSet {
    pub selection: CampaignSelection,
    pub participants: Vec<Participant>,
}

/// Service loading participants from campaign export files.
pub struct ParticipantService {
    fs: Arc<dyn FileSystem>,
    data_dir: PathBuf,
}

impl ParticipantService {
    pub fn new(fs: Arc<dyn FileSystem>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// All campaigns found in the data directory, sorted by name.
    pub fn list_campaigns(&self) -> ApplicationResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .scan()?
            .into_iter()
            .map(|(_, file)| file.campaign)
            .collect();
        campaigns.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(campaigns)
    }

    /// Participants of the selected campaigns, deduplicated by id.
    ///
    /// An empty selection loads every campaign. When a participant is
    /// registered in several campaigns the first campaign in selection order
    /// wins.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, campaign_ids: &[String]) -> ApplicationResult<ParticipantSet> {
        let files = self.scan()?;

        let selected: Vec<CampaignFile> = if campaign_ids.is_empty() {
            files.into_iter().map(|(_, file)| file).collect()
        } else {
            let mut selected = Vec::with_capacity(campaign_ids.len());
            for id in campaign_ids {
                let file = files
                    .iter()
                    .find(|(_, file)| &file.campaign.id == id)
                    .map(|(_, file)| file.clone())
                    .ok_or_else(|| ApplicationError::CampaignNotFound(id.clone()))?;
                selected.push(file);
            }
            selected
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut participants = Vec::new();
        let mut campaigns = Vec::with_capacity(selected.len());
        for file in selected {
            for mut participant in file.participants {
                if !seen.insert(participant.id.clone()) {
                    continue;
                }
                participant
                    .campaign_id
                    .get_or_insert_with(|| file.campaign.id.clone());
                participants.push(participant);
            }
            campaigns.push(file.campaign);
        }
        debug!(
            "loaded {} participants from {} campaigns",
            participants.len(),
            campaigns.len()
        );

        Ok(ParticipantSet {
            selection: CampaignSelection::new(campaigns),
            participants,
        })
    }

    /// Parse every campaign file below the data directory.
    ///
    /// Files repeating an already seen campaign id are skipped.
    fn scan(&self) -> ApplicationResult<Vec<(PathBuf, CampaignFile)>> {
        if !self.fs.is_dir(&self.data_dir) {
            return Err(ApplicationError::DataDirNotFound(self.data_dir.clone()));
        }
        let paths = self
            .fs
            .list_files(&self.data_dir, "json")
            .with_path_context("scan data directory", &self.data_dir)?;

        let mut seen_ids = HashSet::new();
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let file = self.read_campaign_file(&path)?;
            if !seen_ids.insert(file.campaign.id.clone()) {
                warn!(
                    "campaign {} defined again in {}, ignored",
                    file.campaign.id,
                    path.display()
                );
                continue;
            }
            files.push((path, file));
        }
        Ok(files)
    }

    fn read_campaign_file(&self, path: &Path) -> ApplicationResult<CampaignFile> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read campaign file", path)?;
        let file: CampaignFile = serde_json::from_str(&content).in_campaign_file(path)?;
        for participant in &file.participants {
            participant.validate().in_campaign_file(path)?;
        }
        Ok(file)
    }
}
