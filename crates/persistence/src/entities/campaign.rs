//! Campaign entities (database row mappings).
//!
//! Campaign rows arrive in two shapes: the flat rows of the `get_targeted_ads`
//! function and the campaign/creative join used by the fallback and
//! enterprise queries. Both are normalised into [`AdCampaign`] here so that
//! nothing downstream inspects source-specific columns.

use std::collections::HashMap;

use chrono::NaiveDate;
use domain::models::{AdCampaign, AdCreative, AdLevel, CampaignStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Row returned by `get_targeted_ads(space_name, user_country, user_language, device_type)`.
#[derive(Debug, Clone, FromRow)]
pub struct TargetedAdRow {
    pub campaign_id: Uuid,
    pub advertiser_name: String,
    pub creative_id: Option<Uuid>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub cta_url: Option<String>,
    pub cta_text: Option<String>,
}

/// Row of `ad_campaigns LEFT JOIN ad_creatives`.
///
/// `demo_*` columns are the creative fields stored on the campaign itself.
#[derive(Debug, Clone, FromRow)]
pub struct CampaignCreativeRow {
    pub campaign_id: Uuid,
    pub advertiser_name: String,
    pub ad_level: Option<String>,
    pub target_countries: Vec<String>,
    pub target_cities: Vec<String>,
    pub is_demo: bool,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub demo_title: Option<String>,
    pub demo_description: Option<String>,
    pub demo_image_url: Option<String>,
    pub demo_cta_text: Option<String>,
    pub demo_cta_url: Option<String>,
    pub creative_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub cta_text: Option<String>,
    pub cta_url: Option<String>,
}

impl CampaignCreativeRow {
    fn has_demo_creative(&self) -> bool {
        [
            &self.demo_title,
            &self.demo_description,
            &self.demo_image_url,
            &self.demo_cta_text,
            &self.demo_cta_url,
        ]
        .iter()
        .any(|field| field.is_some())
    }

    /// Joined creative fields win; demo fields fill the gaps.
    fn creative(&self) -> Option<AdCreative> {
        let id = match self.creative_id {
            Some(id) => id,
            None if self.has_demo_creative() => self.campaign_id,
            None => return None,
        };
        Some(AdCreative {
            id,
            title: self.title.clone().or_else(|| self.demo_title.clone()),
            description: self
                .description
                .clone()
                .or_else(|| self.demo_description.clone()),
            image_url: self.image_url.clone().or_else(|| self.demo_image_url.clone()),
            video_url: self.video_url.clone(),
            cta_text: self.cta_text.clone().or_else(|| self.demo_cta_text.clone()),
            cta_url: self.cta_url.clone().or_else(|| self.demo_cta_url.clone()),
        })
    }

    fn campaign(&self) -> AdCampaign {
        AdCampaign {
            id: self.campaign_id,
            advertiser_name: self.advertiser_name.clone(),
            ad_level: AdLevel::parse(self.ad_level.as_deref()),
            target_countries: self.target_countries.clone(),
            target_cities: self.target_cities.clone(),
            is_demo: self.is_demo,
            status: CampaignStatus::parse(&self.status).unwrap_or(CampaignStatus::Active),
            start_date: self.start_date,
            end_date: self.end_date,
            creatives: Vec::new(),
        }
    }
}

impl TargetedAdRow {
    fn creative(&self) -> Option<AdCreative> {
        self.creative_id.map(|id| AdCreative {
            id,
            title: self.title.clone(),
            description: None,
            image_url: self.image_url.clone(),
            video_url: None,
            cta_text: self.cta_text.clone(),
            cta_url: self.cta_url.clone(),
        })
    }

    fn campaign(&self) -> AdCampaign {
        AdCampaign {
            id: self.campaign_id,
            advertiser_name: self.advertiser_name.clone(),
            ad_level: AdLevel::Unspecified,
            target_countries: Vec::new(),
            target_cities: Vec::new(),
            is_demo: false,
            status: CampaignStatus::Active,
            start_date: None,
            end_date: None,
            creatives: Vec::new(),
        }
    }
}

/// Campaign rows tagged with the query that produced them.
#[derive(Debug, Clone)]
pub enum RawCampaignRows {
    Targeted(Vec<TargetedAdRow>),
    Joined(Vec<CampaignCreativeRow>),
}

impl RawCampaignRows {
    /// Groups rows per campaign in first-seen order and drops campaigns
    /// that end up with no creative.
    pub fn into_campaigns(self) -> Vec<AdCampaign> {
        let mut builder = CampaignBuilder::default();
        match self {
            RawCampaignRows::Targeted(rows) => {
                for row in &rows {
                    builder.push(row.campaign_id, || row.campaign(), row.creative());
                }
            }
            RawCampaignRows::Joined(rows) => {
                for row in &rows {
                    builder.push(row.campaign_id, || row.campaign(), row.creative());
                }
            }
        }
        builder.finish()
    }
}

#[derive(Default)]
struct CampaignBuilder {
    campaigns: Vec<AdCampaign>,
    index: HashMap<Uuid, usize>,
}

impl CampaignBuilder {
    fn push(&mut self, id: Uuid, campaign: impl FnOnce() -> AdCampaign, creative: Option<AdCreative>) {
        let slot = *self.index.entry(id).or_insert_with(|| {
            self.campaigns.push(campaign());
            self.campaigns.len() - 1
        });
        let Some(creative) = creative else {
            return;
        };
        let creatives = &mut self.campaigns[slot].creatives;
        if !creatives.iter().any(|c| c.id == creative.id) {
            creatives.push(creative);
        }
    }

    fn finish(self) -> Vec<AdCampaign> {
        self.campaigns
            .into_iter()
            .filter(AdCampaign::is_renderable)
            .collect()
    }
}
