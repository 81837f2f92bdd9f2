//! Service activity per date and sample day resolution.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{info, warn};

use super::{Exception, GtfsFeed};
use crate::sample_day::SampleDay;

/// The services selected for the schedule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSelection {
    /// The date the services run on, `None` for [`SampleDay::AllServices`]
    pub date: Option<NaiveDate>,
    /// Active service ids
    pub service_ids: HashSet<String>,
}

impl ServiceSelection {
    pub fn contains(&self, service_id: &str) -> bool {
        self.service_ids.contains(service_id)
    }
}

/// Calendar view of a feed: which service runs on which date.
///
/// Service ids and calendar date exceptions are indexed once on creation, so
/// a lookup does not scan the feed.
pub struct ServiceCalendar<'a> {
    feed: &'a GtfsFeed,
    service_ids: BTreeSet<&'a str>,
    exceptions: HashMap<(&'a str, NaiveDate), Exception>,
}

impl<'a> ServiceCalendar<'a> {
    pub fn new(feed: &'a GtfsFeed) -> Self {
        let service_ids = feed
            .calendar
            .keys()
            .chain(feed.calendar_dates.keys())
            .map(String::as_str)
            .chain(feed.trips.values().map(|t| t.service_id.as_str()))
            .collect();

        let mut exceptions = HashMap::new();
        for (service_id, dates) in &feed.calendar_dates {
            for cd in dates {
                // first listed exception wins
                exceptions
                    .entry((service_id.as_str(), cd.date))
                    .or_insert(cd.exception_type);
            }
        }

        Self {
            feed,
            service_ids,
            exceptions,
        }
    }

    /// Returns true if `service_id` runs on `date`.
    ///
    /// A calendar date exception wins over the weekly pattern of calendar.txt.
    pub fn runs_on(&self, service_id: &str, date: NaiveDate) -> bool {
        match self.exceptions.get(&(service_id, date)) {
            Some(exception) => *exception == Exception::Added,
            None => self
                .feed
                .calendar
                .get(service_id)
                .is_some_and(|c| c.covers(date)),
        }
    }

    /// First and last date mentioned by calendar.txt or calendar_dates.txt
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let calendar_bounds = self
            .feed
            .calendar
            .values()
            .flat_map(|c| [c.start_date, c.end_date]);
        let exception_dates = self
            .feed
            .calendar_dates
            .values()
            .flatten()
            .map(|cd| cd.date);
        let mut dates = calendar_bounds.chain(exception_dates);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Every service id known to the feed, sorted
    pub fn all_service_ids(&self) -> &BTreeSet<&'a str> {
        &self.service_ids
    }

    /// Services running on `date`
    pub fn active_services(&self, date: NaiveDate) -> HashSet<&'a str> {
        self.service_ids
            .iter()
            .copied()
            .filter(|id| self.runs_on(id, date))
            .collect()
    }

    /// The date with the most trips running; the earliest date wins ties.
    pub fn day_with_most_trips(&self) -> Option<NaiveDate> {
        let mut trips_per_service: HashMap<&str, usize> = HashMap::new();
        for trip in self.feed.trips.values() {
            *trips_per_service.entry(trip.service_id.as_str()).or_default() += 1;
        }
        self.busiest_date(|id| trips_per_service.get(id).copied().unwrap_or(0))
    }

    /// The date with the most distinct services running; the earliest date wins ties.
    pub fn day_with_most_services(&self) -> Option<NaiveDate> {
        self.busiest_date(|_| 1)
    }

    /// The date whose running services have the highest summed `weight`.
    fn busiest_date(&self, weight: impl Fn(&str) -> usize) -> Option<NaiveDate> {
        let (first, last) = self.date_range()?;
        let weighted: Vec<(&str, usize)> = self
            .service_ids
            .iter()
            .map(|id| (*id, weight(id)))
            .filter(|(_, w)| *w > 0)
            .collect();
        let mut best: Option<(NaiveDate, usize)> = None;
        for date in first.iter_days().take_while(|d| *d <= last) {
            let count: usize = weighted
                .iter()
                .filter(|(id, _)| self.runs_on(id, date))
                .map(|(_, w)| w)
                .sum();
            if best.is_none_or(|(_, max)| count > max) {
                best = Some((date, count));
            }
        }
        best.map(|(date, _)| date)
    }

    /// Resolves a [`SampleDay`] to the set of services that go into the schedule.
    pub fn select(&self, sample_day: &SampleDay) -> ServiceSelection {
        let date = match sample_day {
            SampleDay::AllServices => {
                let service_ids: HashSet<String> =
                    self.service_ids.iter().copied().map(String::from).collect();
                info!(services = service_ids.len(), "Using all services");
                return ServiceSelection {
                    date: None,
                    service_ids,
                };
            }
            SampleDay::Date(date) => {
                if let Some((first, last)) = self.date_range() {
                    if *date < first || *date > last {
                        warn!(%date, %first, %last, "Sample day is outside the feed's calendar range");
                    }
                }
                Some(*date)
            }
            SampleDay::DayWithMostTrips => self.day_with_most_trips(),
            SampleDay::DayWithMostServices => self.day_with_most_services(),
        };

        let Some(date) = date else {
            warn!(%sample_day, "The feed has no calendar dates, no service selected");
            return ServiceSelection::default();
        };

        let service_ids: HashSet<String> = self
            .active_services(date)
            .into_iter()
            .map(String::from)
            .collect();
        info!(%sample_day, %date, services = service_ids.len(), "Sample day resolved");
        ServiceSelection {
            date: Some(date),
            service_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::{Calendar, CalendarDate, Trip};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekdays(id: &str, start: NaiveDate, end: NaiveDate) -> Calendar {
        Calendar {
            id: id.to_string(),
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
            start_date: start,
            end_date: end,
        }
    }

    fn trip(id: &str, service_id: &str) -> Trip {
        Trip {
            id: id.to_string(),
            service_id: service_id.to_string(),
            route_id: "r".to_string(),
            ..Default::default()
        }
    }

    // 2023-06-12 is a Monday
    fn feed() -> GtfsFeed {
        let mut feed = GtfsFeed::default();
        feed.calendar.insert(
            "WD".to_string(),
            weekdays("WD", date(2023, 6, 12), date(2023, 6, 18)),
        );
        feed.calendar_dates.insert(
            "WD".to_string(),
            vec![CalendarDate {
                service_id: "WD".to_string(),
                date: date(2023, 6, 13),
                exception_type: Exception::Deleted,
            }],
        );
        feed.calendar_dates.insert(
            "EXTRA".to_string(),
            vec![CalendarDate {
                service_id: "EXTRA".to_string(),
                date: date(2023, 6, 17),
                exception_type: Exception::Added,
            }],
        );
        for (id, service) in [("t1", "WD"), ("t2", "WD"), ("t3", "EXTRA"), ("t4", "EXTRA"), ("t5", "EXTRA")] {
            feed.trips.insert(id.to_string(), trip(id, service));
        }
        feed
    }

    #[test]
    fn test_runs_on_weekly_pattern_and_exceptions() {
        let feed = feed();
        let cal = ServiceCalendar::new(&feed);
        assert!(cal.runs_on("WD", date(2023, 6, 12)));
        assert!(!cal.runs_on("WD", date(2023, 6, 13)));
        assert!(!cal.runs_on("WD", date(2023, 6, 17)));
        assert!(!cal.runs_on("WD", date(2023, 6, 19)));
        assert!(cal.runs_on("EXTRA", date(2023, 6, 17)));
        assert!(!cal.runs_on("EXTRA", date(2023, 6, 16)));
        assert!(!cal.runs_on("UNKNOWN", date(2023, 6, 12)));
    }

    #[test]
    fn test_date_range() {
        let feed = feed();
        let cal = ServiceCalendar::new(&feed);
        assert_eq!(cal.date_range(), Some((date(2023, 6, 12), date(2023, 6, 18))));
        assert_eq!(ServiceCalendar::new(&GtfsFeed::default()).date_range(), None);
    }

    #[test]
    fn test_day_with_most_trips() {
        let feed = feed();
        let cal = ServiceCalendar::new(&feed);
        // three EXTRA trips on saturday beat two WD trips on each weekday
        assert_eq!(cal.day_with_most_trips(), Some(date(2023, 6, 17)));
    }

    #[test]
    fn test_day_with_most_services_ties_pick_earliest() {
        let feed = feed();
        let cal = ServiceCalendar::new(&feed);
        assert_eq!(cal.day_with_most_services(), Some(date(2023, 6, 12)));
    }

    #[test]
    fn test_first_listed_exception_wins() {
        let mut feed = feed();
        feed.calendar_dates.get_mut("WD").unwrap().push(CalendarDate {
            service_id: "WD".to_string(),
            date: date(2023, 6, 13),
            exception_type: Exception::Added,
        });
        assert!(!ServiceCalendar::new(&feed).runs_on("WD", date(2023, 6, 13)));
    }

    #[test]
    fn test_busiest_day_in_large_feed() {
        // 200 weekday services over three years, 50 trips each
        let mut feed = GtfsFeed::default();
        let (start, end) = (date(2022, 1, 3), date(2024, 12, 31));
        for s in 0..200 {
            let id = format!("S{s}");
            feed.calendar.insert(id.clone(), weekdays(&id, start, end));
            feed.calendar_dates.insert(
                id.clone(),
                vec![CalendarDate {
                    service_id: id.clone(),
                    date: date(2022, 1, 3),
                    exception_type: Exception::Deleted,
                }],
            );
            for t in 0..50 {
                let trip_id = format!("{id}_{t}");
                feed.trips.insert(trip_id.clone(), trip(&trip_id, &id));
            }
        }
        // one extra service only on a single wednesday
        feed.calendar_dates.insert(
            "PEAK".to_string(),
            vec![CalendarDate {
                service_id: "PEAK".to_string(),
                date: date(2023, 11, 15),
                exception_type: Exception::Added,
            }],
        );
        feed.trips.insert("peak".to_string(), trip("peak", "PEAK"));

        let cal = ServiceCalendar::new(&feed);
        assert_eq!(cal.all_service_ids().len(), 201);
        assert_eq!(cal.day_with_most_trips(), Some(date(2023, 11, 15)));
        assert_eq!(cal.day_with_most_services(), Some(date(2023, 11, 15)));
        assert_eq!(cal.active_services(date(2022, 1, 3)).len(), 0);
        assert_eq!(cal.active_services(date(2022, 1, 4)).len(), 200);
    }

    #[test]
    fn test_select_all_services() {
        let feed = feed();
        let selection = ServiceCalendar::new(&feed).select(&SampleDay::AllServices);
        assert_eq!(selection.date, None);
        assert!(selection.contains("WD"));
        assert!(selection.contains("EXTRA"));
    }

    #[test]
    fn test_select_explicit_date() {
        let feed = feed();
        let cal = ServiceCalendar::new(&feed);
        let selection = cal.select(&SampleDay::Date(date(2023, 6, 14)));
        assert_eq!(selection.date, Some(date(2023, 6, 14)));
        assert_eq!(selection.service_ids, HashSet::from(["WD".to_string()]));

        let outside = cal.select(&SampleDay::Date(date(2024, 1, 1)));
        assert!(outside.service_ids.is_empty());
    }

    #[test]
    fn test_select_without_calendar_is_empty() {
        let feed = GtfsFeed::default();
        let selection = ServiceCalendar::new(&feed).select(&SampleDay::DayWithMostTrips);
        assert_eq!(selection, ServiceSelection::default());
    }
}
