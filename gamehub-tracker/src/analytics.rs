use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::{Console, GameRequestData, RequestStatus};

/// Aggregated numbers for the admin dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Analytics {
    pub total: usize,
    /// Every status, including the ones without requests
    pub by_status: Vec<(RequestStatus, usize)>,
    pub by_console: BTreeMap<Console, usize>,
    /// Requests per day, oldest first
    pub requests_over_time: Vec<(NaiveDate, usize)>,
    pub top_games: Vec<TopGame>,
    /// Approved requests that are in the library
    pub available: usize,
    /// All requests, newest first
    pub requests: Vec<GameRequestData>,
}

/// Upvotes summed over every request for the same game
#[derive(Debug, Clone, PartialEq)]
pub struct TopGame {
    pub title: String,
    pub upvotes: u64,
    /// How many requests (one per console) exist for the game
    pub count: usize,
}

impl Analytics {
    pub const TOP_GAMES: usize = 15;

    pub fn from_requests(mut requests: Vec<GameRequestData>) -> Self {
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut by_status: Vec<_> = RequestStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_console = BTreeMap::new();
        let mut by_date = BTreeMap::new();
        let mut top_games: Vec<TopGame> = Vec::new();
        let mut game_index = HashMap::new();

        for request in &requests {
            if let Some((_, count)) = by_status.iter_mut().find(|(s, _)| *s == request.status) {
                *count += 1;
            }

            *by_console.entry(request.console).or_insert(0) += 1;
            *by_date.entry(request.created_at.date_naive()).or_insert(0) += 1;

            // Requests for the same game on different consoles count together
            let key = match request.catalog_id {
                Some(id) => id.to_string(),
                None => request.game_title.clone(),
            };

            match game_index.get(&key) {
                Some(&index) => {
                    let game: &mut TopGame = &mut top_games[index];
                    game.upvotes += u64::from(request.upvotes);
                    game.count += 1;
                }
                None => {
                    game_index.insert(key, top_games.len());
                    top_games.push(TopGame {
                        title: request.game_title.clone(),
                        upvotes: u64::from(request.upvotes),
                        count: 1,
                    });
                }
            }
        }

        top_games.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
        top_games.truncate(Self::TOP_GAMES);

        let available = requests
            .iter()
            .filter(|r| r.status == RequestStatus::Approved && r.available)
            .count();

        Self {
            total: requests.len(),
            by_status,
            by_console,
            requests_over_time: by_date.into_iter().collect(),
            top_games,
            available,
            requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn request(
        title: &str,
        catalog_id: Option<i64>,
        console: Console,
        day: u32,
        upvotes: u32,
    ) -> GameRequestData {
        GameRequestData {
            id: Uuid::new_v4(),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            requester: "Anonymous".to_string(),
            game_title: title.to_string(),
            game_image: None,
            catalog_id,
            console,
            status: RequestStatus::Pending,
            rejection_reason: None,
            available: false,
            upvotes,
        }
    }

    #[test]
    fn aggregates_requests() {
        let mut approved = request("Hades", Some(1), Console::Pc, 2, 3);
        approved.status = RequestStatus::Approved;
        approved.available = true;

        let analytics = Analytics::from_requests(vec![
            request("Elden Ring", Some(7), Console::Ps5, 1, 4),
            request("Elden Ring", Some(7), Console::Pc, 2, 2),
            approved,
            request("Tetris", None, Console::NintendoSwitch, 2, 5),
        ]);

        assert_eq!(analytics.total, 4);
        assert_eq!(
            analytics.by_status,
            vec![
                (RequestStatus::Pending, 3),
                (RequestStatus::Approved, 1),
                (RequestStatus::Rejected, 0),
            ]
        );
        assert_eq!(analytics.by_console[&Console::Pc], 2);
        assert_eq!(
            analytics.requests_over_time,
            vec![
                (NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 1),
                (NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), 3),
            ]
        );
        assert_eq!(
            analytics.top_games[0],
            TopGame {
                title: "Elden Ring".to_string(),
                upvotes: 6,
                count: 2,
            }
        );
        assert_eq!(analytics.top_games[1].title, "Tetris");
        assert_eq!(analytics.available, 1);
        assert_eq!(analytics.requests[3].created_at.date_naive().to_string(), "2024-03-01");
    }

    #[test]
    fn limits_top_games() {
        let requests = (0..20)
            .map(|i| request(&format!("Game {}", i), Some(i), Console::Ps5, 1, i as u32))
            .collect();

        let analytics = Analytics::from_requests(requests);

        assert_eq!(analytics.top_games.len(), Analytics::TOP_GAMES);
        assert_eq!(analytics.top_games[0].upvotes, 19);
    }
}
