use futures::future::try_join_all;
use uuid::Uuid;

use super::image_service::ImageService;
use super::job_service::JobService;
use super::property_service::PropertyService;
use crate::error::ApiError;
use crate::models::{ImageTarget, PropertyDetail};
use crate::report::{Report, ReportBuilder, ReportExtras, ReportOptions, ReportSelection};

/// Fetches what a report needs and hands it to the builder
#[derive(Clone)]
pub struct ReportService {
    properties: PropertyService,
    images: ImageService,
    jobs: JobService,
}

impl ReportService {
    pub fn new(properties: PropertyService, images: ImageService, jobs: JobService) -> Self {
        Self {
            properties,
            images,
            jobs,
        }
    }

    /// Property detail, ready for building a selection against
    pub async fn detail(&self, property_id: Uuid) -> Result<PropertyDetail, ApiError> {
        self.properties.detail(property_id).await
    }

    /// Fetch the property detail and build a report over the given selection.
    /// Selections made against an older detail simply drop ids that no longer exist.
    #[tracing::instrument(skip(self, selection, options))]
    pub async fn build(
        &self,
        property_id: Uuid,
        selection: &ReportSelection,
        options: &ReportOptions,
    ) -> Result<Report, ApiError> {
        let detail = self.properties.detail(property_id).await?;
        self.build_with_detail(&detail, selection, options).await
    }

    /// Build over a detail the caller already holds
    #[tracing::instrument(skip_all, fields(property_id = %detail.property.id))]
    pub async fn build_with_detail(
        &self,
        detail: &PropertyDetail,
        selection: &ReportSelection,
        options: &ReportOptions,
    ) -> Result<Report, ApiError> {
        if selection.is_empty() {
            return Err(ApiError::validation("nothing selected for the report"));
        }

        let extras = self.extras(detail, selection, options).await?;
        Ok(ReportBuilder::build(detail, selection, options, &extras))
    }

    /// Everything selected
    pub async fn build_all(&self, property_id: Uuid, options: &ReportOptions) -> Result<Report, ApiError> {
        let detail = self.properties.detail(property_id).await?;
        let selection = ReportSelection::from_detail(&detail, true);
        let extras = self.extras(&detail, &selection, options).await?;
        Ok(ReportBuilder::build(&detail, &selection, options, &extras))
    }

    async fn extras(
        &self,
        detail: &PropertyDetail,
        selection: &ReportSelection,
        options: &ReportOptions,
    ) -> Result<ReportExtras, ApiError> {
        let property_id = detail.property.id;
        let mut extras = ReportExtras::default();

        if options.include_images {
            let mut targets = vec![ImageTarget::property(property_id)];
            for space_id in selection.selected_spaces() {
                targets.push(ImageTarget::space(space_id));
                targets.extend(selection.selected_assets(space_id).into_iter().map(ImageTarget::asset));
            }
            let lists = try_join_all(targets.into_iter().map(|t| self.images.list(t))).await?;
            extras.images = lists.into_iter().flatten().collect();
        }

        if options.include_jobs {
            extras.jobs = self.jobs.list(property_id).await?;
        }

        tracing::debug!(
            images = extras.images.len(),
            jobs = extras.jobs.len(),
            "report extras fetched"
        );
        Ok(extras)
    }
}
