use crate::trip::{
    is_long_enough_destination, Activity, Confirmation, DayActivities, Link, NewActivity, NewLink,
    NewTrip, Participant, Trip, TripUpdate, MIN_DESTINATION_LEN,
};
use crate::validate::{is_valid_email, is_valid_url};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::iter::successors;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::Date;
use tracing::{debug, info};
use uuid::Uuid;

/// The trip-management service that trips, activities, links, and guests
/// are stored in
pub(crate) trait TripServer {
    fn create_trip(&mut self, trip: NewTrip) -> Result<Uuid, ServerError>;

    fn get_trip(&self, trip_id: Uuid) -> Result<Trip, ServerError>;

    /// Rejects date changes that would leave existing activities outside the
    /// trip
    fn update_trip(&mut self, trip_id: Uuid, update: TripUpdate) -> Result<(), ServerError>;

    /// Mark the trip itself as confirmed by its owner
    fn confirm_trip(&mut self, trip_id: Uuid) -> Result<(), ServerError>;

    fn create_activity(
        &mut self,
        trip_id: Uuid,
        activity: NewActivity,
    ) -> Result<Uuid, ServerError>;

    /// Returns one entry for every day of the trip, in order, each listing
    /// that day's activities sorted by time
    fn activities(&self, trip_id: Uuid) -> Result<Vec<DayActivities>, ServerError>;

    fn create_link(&mut self, trip_id: Uuid, link: NewLink) -> Result<Uuid, ServerError>;

    fn links(&self, trip_id: Uuid) -> Result<Vec<Link>, ServerError>;

    fn participants(&self, trip_id: Uuid) -> Result<Vec<Participant>, ServerError>;

    fn confirm_participant(
        &mut self,
        participant_id: Uuid,
        confirmation: Confirmation,
    ) -> Result<(), ServerError>;
}

#[derive(Debug, Error)]
pub(crate) enum ServerError {
    #[error("trip {0} not found")]
    TripNotFound(Uuid),
    #[error("participant {0} not found")]
    ParticipantNotFound(Uuid),
    #[error("request rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("failed to read trip database {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write trip database {}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to decode trip database {}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode trip database")]
    Encode(#[source] serde_json::Error),
}

/// Reasons for the server to refuse a request
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum Rejection {
    #[error("destination must be at least {} characters long", MIN_DESTINATION_LEN)]
    DestinationTooShort,
    #[error("trip cannot end before it starts")]
    EndsBeforeStart,
    #[error("invalid email address {0:?}")]
    InvalidEmail(String),
    #[error("activity does not take place during the trip")]
    ActivityOutsideTrip,
    #[error("{0} activities would fall outside the new dates")]
    ActivitiesOutsideNewDates(usize),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("invalid URL {0:?}")]
    InvalidUrl(String),
    #[error("name must not be empty")]
    EmptyName,
}

/// A `TripServer` that keeps everything in a local JSON document
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct LocalServer {
    db: Database,
    // `None` for a purely in-memory server
    path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
struct Database {
    trips: Vec<TripRecord>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct TripRecord {
    trip: Trip,
    #[serde(default)]
    activities: Vec<Activity>,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    participants: Vec<Participant>,
}

impl LocalServer {
    #[cfg(test)]
    pub(crate) fn in_memory() -> LocalServer {
        LocalServer::default()
    }

    /// Load the database at `path`.  A nonexistent file is treated as an
    /// empty database and will be created on the first write.
    pub(crate) fn open(path: PathBuf) -> Result<LocalServer, ServerError> {
        let db = match fs::read_to_string(&path) {
            Ok(src) => serde_json::from_str(&src).map_err(|source| ServerError::Decode {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Database::default(),
            Err(source) => return Err(ServerError::Read { path, source }),
        };
        debug!(path = %path.display(), trips = db.trips.len(), "Loaded trip database");
        Ok(LocalServer {
            db,
            path: Some(path),
        })
    }

    fn persist(&self) -> Result<(), ServerError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let src = serde_json::to_string_pretty(&self.db).map_err(ServerError::Encode)?;
        write_file(path, &src).map_err(|source| ServerError::Write {
            path: path.to_owned(),
            source,
        })?;
        debug!(path = %path.display(), "Saved trip database");
        Ok(())
    }

    fn record(&self, trip_id: Uuid) -> Result<&TripRecord, ServerError> {
        self.db
            .trips
            .iter()
            .find(|r| r.trip.id == trip_id)
            .ok_or(ServerError::TripNotFound(trip_id))
    }

    fn record_mut(&mut self, trip_id: Uuid) -> Result<&mut TripRecord, ServerError> {
        self.db
            .trips
            .iter_mut()
            .find(|r| r.trip.id == trip_id)
            .ok_or(ServerError::TripNotFound(trip_id))
    }
}

impl TripServer for LocalServer {
    fn create_trip(&mut self, trip: NewTrip) -> Result<Uuid, ServerError> {
        check_trip_details(&trip.destination, trip.starts_at, trip.ends_at)?;
        let mut participants: Vec<Participant> = Vec::with_capacity(trip.emails_to_invite.len());
        for email in trip.emails_to_invite {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(Rejection::InvalidEmail(email).into());
            }
            if participants.iter().all(|p| p.email != email) {
                participants.push(Participant {
                    id: Uuid::new_v4(),
                    name: None,
                    email,
                    is_confirmed: false,
                });
            }
        }
        let id = Uuid::new_v4();
        info!(
            trip_id = %id,
            destination = %trip.destination,
            guests = participants.len(),
            "Created trip"
        );
        self.db.trips.push(TripRecord {
            trip: Trip {
                id,
                destination: trip.destination,
                starts_at: trip.starts_at,
                ends_at: trip.ends_at,
                is_confirmed: false,
            },
            activities: Vec::new(),
            links: Vec::new(),
            participants,
        });
        self.persist()?;
        Ok(id)
    }

    fn get_trip(&self, trip_id: Uuid) -> Result<Trip, ServerError> {
        self.record(trip_id).map(|r| r.trip.clone())
    }

    fn update_trip(&mut self, trip_id: Uuid, update: TripUpdate) -> Result<(), ServerError> {
        check_trip_details(&update.destination, update.starts_at, update.ends_at)?;
        let record = self.record_mut(trip_id)?;
        let stranded = record
            .activities
            .iter()
            .filter(|a| {
                let date = a.occurs_at.date();
                date < update.starts_at || update.ends_at < date
            })
            .count();
        if stranded > 0 {
            return Err(Rejection::ActivitiesOutsideNewDates(stranded).into());
        }
        record.trip.destination = update.destination;
        record.trip.starts_at = update.starts_at;
        record.trip.ends_at = update.ends_at;
        info!(trip_id = %trip_id, "Updated trip");
        self.persist()
    }

    fn confirm_trip(&mut self, trip_id: Uuid) -> Result<(), ServerError> {
        self.record_mut(trip_id)?.trip.is_confirmed = true;
        info!(trip_id = %trip_id, "Confirmed trip");
        self.persist()
    }

    fn create_activity(
        &mut self,
        trip_id: Uuid,
        activity: NewActivity,
    ) -> Result<Uuid, ServerError> {
        if activity.title.trim().is_empty() {
            return Err(Rejection::EmptyTitle.into());
        }
        let record = self.record_mut(trip_id)?;
        if !record.trip.contains(activity.occurs_at.date()) {
            return Err(Rejection::ActivityOutsideTrip.into());
        }
        let id = Uuid::new_v4();
        record.activities.push(Activity {
            id,
            title: activity.title,
            occurs_at: activity.occurs_at,
        });
        info!(trip_id = %trip_id, activity_id = %id, "Created activity");
        self.persist()?;
        Ok(id)
    }

    fn activities(&self, trip_id: Uuid) -> Result<Vec<DayActivities>, ServerError> {
        let record = self.record(trip_id)?;
        let ends_at = record.trip.ends_at;
        Ok(successors(Some(record.trip.starts_at), |d| d.next_day())
            .take_while(|&d| d <= ends_at)
            .map(|date| {
                let mut activities = record
                    .activities
                    .iter()
                    .filter(|a| a.occurs_at.date() == date)
                    .cloned()
                    .collect::<Vec<_>>();
                activities.sort_by_key(|a| a.occurs_at);
                DayActivities { date, activities }
            })
            .collect())
    }

    fn create_link(&mut self, trip_id: Uuid, link: NewLink) -> Result<Uuid, ServerError> {
        if link.title.trim().is_empty() {
            return Err(Rejection::EmptyTitle.into());
        }
        if !is_valid_url(&link.url) {
            return Err(Rejection::InvalidUrl(link.url).into());
        }
        let record = self.record_mut(trip_id)?;
        let id = Uuid::new_v4();
        record.links.push(Link {
            id,
            title: link.title,
            url: link.url,
        });
        info!(trip_id = %trip_id, link_id = %id, "Created link");
        self.persist()?;
        Ok(id)
    }

    fn links(&self, trip_id: Uuid) -> Result<Vec<Link>, ServerError> {
        self.record(trip_id).map(|r| r.links.clone())
    }

    fn participants(&self, trip_id: Uuid) -> Result<Vec<Participant>, ServerError> {
        self.record(trip_id).map(|r| r.participants.clone())
    }

    fn confirm_participant(
        &mut self,
        participant_id: Uuid,
        confirmation: Confirmation,
    ) -> Result<(), ServerError> {
        let name = confirmation.name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyName.into());
        }
        let email = confirmation.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(Rejection::InvalidEmail(email).into());
        }
        let participant = self
            .db
            .trips
            .iter_mut()
            .flat_map(|r| r.participants.iter_mut())
            .find(|p| p.id == participant_id)
            .ok_or(ServerError::ParticipantNotFound(participant_id))?;
        participant.name = Some(name.to_owned());
        participant.email = email;
        participant.is_confirmed = true;
        info!(participant_id = %participant_id, "Confirmed participant");
        self.persist()
    }
}

fn check_trip_details(destination: &str, starts_at: Date, ends_at: Date) -> Result<(), Rejection> {
    if !is_long_enough_destination(destination) {
        Err(Rejection::DestinationTooShort)
    } else if ends_at < starts_at {
        Err(Rejection::EndsBeforeStart)
    } else {
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
