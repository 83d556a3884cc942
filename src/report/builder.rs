use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::selection::ReportSelection;
use crate::models::{Asset, Feature, Image, Job, JobStatus, PropertyDetail};
use crate::types::EntityType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Defaults to the property name
    pub title: Option<String>,
    pub include_features: bool,
    pub include_images: bool,
    pub include_jobs: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: None,
            include_features: true,
            include_images: false,
            include_jobs: false,
        }
    }
}

/// Data fetched alongside the property detail when the options ask for it
#[derive(Debug, Clone, Default)]
pub struct ReportExtras {
    pub images: Vec<Image>,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProperty {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub status: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub space_id: Uuid,
    pub name: String,
    pub kind: Option<String>,
    pub floor: Option<String>,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportImage {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub file_name: String,
    pub url: String,
    pub is_splash: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportJob {
    pub title: String,
    pub contractor_name: Option<String>,
    pub status: JobStatus,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub asset_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTotals {
    pub spaces: usize,
    pub assets: usize,
}

/// Structured report document; rendering to PDF happens elsewhere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub property: ReportProperty,
    pub sections: Vec<ReportSection>,
    pub features: Vec<Feature>,
    pub images: Vec<ReportImage>,
    pub jobs: Vec<ReportJob>,
    pub totals: ReportTotals,
}

pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(
        detail: &PropertyDetail,
        selection: &ReportSelection,
        options: &ReportOptions,
        extras: &ReportExtras,
    ) -> Report {
        let now = Utc::now();
        let property = &detail.property;

        // Sections keep backend order; only selected spaces and assets survive
        let sections: Vec<ReportSection> = detail
            .spaces
            .iter()
            .filter(|s| selection.is_space_selected(s.space.id))
            .map(|s| ReportSection {
                space_id: s.space.id,
                name: s.space.name.clone(),
                kind: s.space.kind.clone(),
                floor: s.space.floor.clone(),
                assets: s
                    .assets
                    .iter()
                    .filter(|a| selection.is_asset_selected(s.space.id, a.id))
                    .cloned()
                    .collect(),
            })
            .collect();

        let included: HashSet<Uuid> = std::iter::once(property.id)
            .chain(sections.iter().map(|s| s.space_id))
            .chain(sections.iter().flat_map(|s| s.assets.iter().map(|a| a.id)))
            .collect();

        let images = if options.include_images {
            extras
                .images
                .iter()
                .filter(|img| included.contains(&img.entity_id))
                .map(|img| ReportImage {
                    entity_type: img.entity_type,
                    entity_id: img.entity_id,
                    file_name: img.file_name.clone(),
                    url: img.url.clone(),
                    is_splash: property.splash_image_id == Some(img.id),
                })
                .collect()
        } else {
            Vec::new()
        };

        let jobs = if options.include_jobs {
            extras
                .jobs
                .iter()
                .filter(|job| matches!(job.status(now), JobStatus::Active | JobStatus::Scheduled))
                .map(|job| ReportJob {
                    title: job.title.clone(),
                    contractor_name: job.contractor_name.clone(),
                    status: job.status(now),
                    starts_at: job.starts_at,
                    expires_at: job.expires_at,
                    asset_count: job.asset_ids.len(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let features = if options.include_features {
            detail.features.clone()
        } else {
            Vec::new()
        };

        let totals = ReportTotals {
            spaces: sections.len(),
            assets: sections.iter().map(|s| s.assets.len()).sum(),
        };

        Report {
            title: options
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| property.name.clone()),
            generated_at: now,
            property: ReportProperty {
                id: property.id,
                name: property.name.clone(),
                address: property.address.clone(),
                city: property.city.clone(),
                postcode: property.postcode.clone(),
                status: property.status.as_str().to_string(),
                description: property.description.clone(),
            },
            sections,
            features,
            images,
            jobs,
            totals,
        }
    }
}

impl Report {
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count().max(8)))?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(f)?;

        let p = &self.property;
        writeln!(f, "Property: {}", p.name)?;
        let mut address = p.address.clone();
        for part in [&p.city, &p.postcode].into_iter().flatten() {
            address.push_str(", ");
            address.push_str(part);
        }
        writeln!(f, "Address:  {}", address)?;
        writeln!(f, "Status:   {}", p.status)?;
        if let Some(desc) = p.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(f, "\n{}", desc)?;
        }

        if !self.features.is_empty() {
            writeln!(f, "\nFeatures")?;
            writeln!(f, "{}", "-".repeat(8))?;
            for feature in &self.features {
                match feature.value.as_deref() {
                    Some(value) => writeln!(f, "  {}: {}", feature.name, value)?,
                    None => writeln!(f, "  {}", feature.name)?,
                }
            }
        }

        for section in &self.sections {
            writeln!(f, "\n{}", section.name)?;
            writeln!(f, "{}", "-".repeat(section.name.chars().count().max(4)))?;
            if let Some(floor) = section.floor.as_deref() {
                writeln!(f, "  Floor: {}", floor)?;
            }
            if section.assets.is_empty() {
                writeln!(f, "  (no assets)")?;
            }
            for asset in &section.assets {
                write!(f, "  - {}", asset.name)?;
                let maker: Vec<&str> = [asset.make.as_deref(), asset.model.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                if !maker.is_empty() {
                    write!(f, " ({})", maker.join(" "))?;
                }
                if let Some(serial) = asset.serial_number.as_deref() {
                    write!(f, " S/N {}", serial)?;
                }
                writeln!(f)?;
            }
        }

        if !self.jobs.is_empty() {
            writeln!(f, "\nAccess jobs")?;
            writeln!(f, "{}", "-".repeat(11))?;
            for job in &self.jobs {
                write!(
                    f,
                    "  {} [{}] {} -> {}",
                    job.title,
                    job.status.as_str(),
                    job.starts_at.format("%Y-%m-%d %H:%M"),
                    job.expires_at.format("%Y-%m-%d %H:%M"),
                )?;
                if let Some(contractor) = job.contractor_name.as_deref() {
                    write!(f, " ({})", contractor)?;
                }
                writeln!(f)?;
            }
        }

        if !self.images.is_empty() {
            writeln!(f, "\nImages")?;
            writeln!(f, "{}", "-".repeat(6))?;
            for image in &self.images {
                let marker = if image.is_splash { " *" } else { "" };
                writeln!(f, "  {}{} {}", image.file_name, marker, image.url)?;
            }
        }

        writeln!(f, "\n{} space(s), {} asset(s)", self.totals.spaces, self.totals.assets)
    }
}
