//! Reference collections backing the race form's selectors.

use tracing::info;

use crate::{
    api::{ApiError, ResourceStore},
    controller::{ActionError, ListController},
    models::{ChoiceSource, Director, License, Race, Sponsor},
};

/// Read-only lookups loaded next to the race collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceReferenceData {
    /// Known directors.
    pub directors: Vec<Director>,
    /// Known sponsors.
    pub sponsors: Vec<Sponsor>,
    /// Known licenses.
    pub licenses: Vec<License>,
}

impl RaceReferenceData {
    /// Option values for a selector field.
    pub fn choices(&self, source: ChoiceSource) -> Vec<String> {
        match source {
            ChoiceSource::Directors => self.directors.iter().map(|d| d.name.clone()).collect(),
            ChoiceSource::Sponsors => self.sponsors.iter().map(|s| s.sp_name.clone()).collect(),
            ChoiceSource::Licenses => self.licenses.iter().map(|l| l.lic_no.clone()).collect(),
        }
    }
}

/// Fetch races and the three reference collections concurrently.
///
/// Fails as a whole as soon as any one fetch fails.
pub async fn fetch_race_screen<RS, DS, SS, LS>(
    races: &RS,
    directors: &DS,
    sponsors: &SS,
    licenses: &LS,
) -> Result<(Vec<Race>, RaceReferenceData), ApiError>
where
    RS: ResourceStore<Race> + ?Sized,
    DS: ResourceStore<Director> + ?Sized,
    SS: ResourceStore<Sponsor> + ?Sized,
    LS: ResourceStore<License> + ?Sized,
{
    let (races, directors, sponsors, licenses) = tokio::try_join!(
        races.list(),
        directors.list(),
        sponsors.list(),
        licenses.list()
    )?;

    info!(
        races = races.len(),
        directors = directors.len(),
        sponsors = sponsors.len(),
        licenses = licenses.len(),
        "race screen data loaded"
    );

    Ok((
        races,
        RaceReferenceData {
            directors,
            sponsors,
            licenses,
        },
    ))
}

/// Split a race-screen fetch into the controller update and the lookups.
///
/// On failure the controller enters `Failed`.
pub fn apply_race_screen(
    controller: &mut ListController<Race>,
    result: Result<(Vec<Race>, RaceReferenceData), ApiError>,
) -> Result<RaceReferenceData, ActionError> {
    let (races, reference) = match result {
        Ok(loaded) => loaded,
        Err(err) => {
            return controller
                .finish_load(Err(err))
                .map(|()| RaceReferenceData::default())
        }
    };
    controller.finish_load(Ok(races))?;
    Ok(reference)
}

/// Load the race controller together with its reference data.
pub async fn load_race_screen<RS, DS, SS, LS>(
    controller: &mut ListController<Race>,
    races: &RS,
    directors: &DS,
    sponsors: &SS,
    licenses: &LS,
) -> Result<RaceReferenceData, ActionError>
where
    RS: ResourceStore<Race> + ?Sized,
    DS: ResourceStore<Director> + ?Sized,
    SS: ResourceStore<Sponsor> + ?Sized,
    LS: ResourceStore<License> + ?Sized,
{
    controller.begin_load();
    let result = fetch_race_screen(races, directors, sponsors, licenses).await;
    apply_race_screen(controller, result)
}
