use crate::server::{ServerError, TripServer};
use crate::storage::TripStorage;
use crate::trip::{
    ActivitySection, Confirmation, Link, NewActivity, NewLink, NewTrip, Participant, Trip,
    TripUpdate,
};
use anyhow::Context;
use std::fmt;
use time::PrimitiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

/// Ties a trip server to the locally remembered current trip
#[derive(Debug)]
pub(crate) struct Session<S> {
    server: S,
    storage: TripStorage,
}

impl<S: TripServer> Session<S> {
    pub(crate) fn new(server: S, storage: TripStorage) -> Session<S> {
        Session { server, storage }
    }

    /// Create a trip and make it the current one
    pub(crate) fn create_trip(&mut self, trip: NewTrip) -> anyhow::Result<Uuid> {
        let trip_id = self
            .server
            .create_trip(trip)
            .context("failed to create trip")?;
        self.storage.save(trip_id)?;
        Ok(trip_id)
    }

    /// Look up the current trip.  A remembered trip that the server no longer
    /// knows about is forgotten.
    pub(crate) fn current_trip(&mut self) -> anyhow::Result<Option<Trip>> {
        let Some(trip_id) = self.storage.get()? else {
            return Ok(None);
        };
        match self.server.get_trip(trip_id) {
            Ok(trip) => Ok(Some(trip)),
            Err(ServerError::TripNotFound(_)) => {
                warn!(%trip_id, "Remembered trip no longer exists; forgetting it");
                self.storage.remove()?;
                Ok(None)
            }
            Err(e) => Err(e).context("failed to fetch current trip"),
        }
    }

    fn require_trip(&mut self) -> anyhow::Result<Trip> {
        self.current_trip()?
            .context("no current trip; create one with `tripcal new`")
    }

    /// Gather everything shown for the current trip
    pub(crate) fn overview(&mut self, now: PrimitiveDateTime) -> anyhow::Result<Option<Overview>> {
        let Some(trip) = self.current_trip()? else {
            return Ok(None);
        };
        let sections = self
            .server
            .activities(trip.id)
            .context("failed to fetch activities")?
            .iter()
            .map(|day| ActivitySection::new(day, now))
            .collect();
        let links = self.server.links(trip.id).context("failed to fetch links")?;
        let participants = self
            .server
            .participants(trip.id)
            .context("failed to fetch guests")?;
        Ok(Some(Overview {
            trip,
            sections,
            links,
            participants,
        }))
    }

    pub(crate) fn update_trip(&mut self, update: TripUpdate) -> anyhow::Result<Trip> {
        let trip = self.require_trip()?;
        self.server
            .update_trip(trip.id, update)
            .context("failed to update trip")?;
        Ok(self.server.get_trip(trip.id)?)
    }

    /// Confirm the current trip and return its updated state
    pub(crate) fn confirm_trip(&mut self) -> anyhow::Result<Trip> {
        let trip = self.require_trip()?;
        self.server
            .confirm_trip(trip.id)
            .context("failed to confirm trip")?;
        Ok(self.server.get_trip(trip.id)?)
    }

    pub(crate) fn add_activity(&mut self, activity: NewActivity) -> anyhow::Result<Uuid> {
        let trip = self.require_trip()?;
        self.server
            .create_activity(trip.id, activity)
            .context("failed to add activity")
    }

    pub(crate) fn add_link(&mut self, link: NewLink) -> anyhow::Result<Uuid> {
        let trip = self.require_trip()?;
        self.server
            .create_link(trip.id, link)
            .context("failed to add link")
    }

    pub(crate) fn confirm(
        &mut self,
        participant_id: Uuid,
        confirmation: Confirmation,
    ) -> anyhow::Result<()> {
        self.server
            .confirm_participant(participant_id, confirmation)
            .context("failed to confirm attendance")
    }

    /// Stop remembering the current trip.  The trip itself is kept.
    pub(crate) fn forget(&mut self) -> anyhow::Result<()> {
        self.storage.remove()?;
        info!("Forgot current trip");
        Ok(())
    }
}

/// The current trip with its itinerary, links, and guest list
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Overview {
    pub(crate) trip: Trip,
    pub(crate) sections: Vec<ActivitySection>,
    pub(crate) links: Vec<Link>,
    pub(crate) participants: Vec<Participant>,
}

impl fmt::Display for Overview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.trip.when())?;
        if self.trip.is_confirmed {
            writeln!(f, "  (confirmed)")?;
        } else {
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "Activities")?;
        for section in &self.sections {
            writeln!(f, "  Day {:02}  {}", section.day_number, section.day_name)?;
            if section.items.is_empty() {
                writeln!(f, "    No activities registered for this date.")?;
            }
            for item in &section.items {
                let mark = if item.is_before { "✓" } else { " " };
                writeln!(f, "    {mark} {}  {}", item.hour, item.title)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Important links")?;
        if self.links.is_empty() {
            writeln!(f, "  No links registered.")?;
        }
        for link in &self.links {
            writeln!(f, "  {}  <{}>", link.title, link.url)?;
        }
        writeln!(f)?;
        writeln!(f, "Guests")?;
        if self.participants.is_empty() {
            writeln!(f, "  Nobody has been invited.")?;
        }
        for p in &self.participants {
            let status = if p.is_confirmed {
                "confirmed"
            } else {
                "pending"
            };
            writeln!(
                f,
                "  {} <{}>  {status}  [{}]",
                p.display_name(),
                p.email,
                p.id
            )?;
        }
        Ok(())
    }
}
