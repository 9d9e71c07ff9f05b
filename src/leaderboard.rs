//! Score aggregation across teams and rounds.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{PageEntity, QuestionEntity, ResponseEntity, TeamEntity};

/// Aggregation failures caused by referentially broken data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaderboardError {
    /// A response points at a question that no longer exists.
    #[error("response references unknown question `{0}`")]
    UnknownQuestion(Uuid),
    /// A question points at a page that no longer exists.
    #[error("question references unknown page `{0}`")]
    UnknownPage(Uuid),
}

/// One team's aggregated scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// Team being ranked.
    pub team_id: Uuid,
    /// Team display name.
    pub name: String,
    /// Free-text member list.
    pub members: String,
    /// Points per round, aligned with [`Leaderboard::rounds`].
    pub by_round: Vec<i32>,
    /// Sum over all rounds.
    pub total: i32,
}

/// Full standings table for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    /// Round numbers in board order; hidden pages are not rounds.
    pub rounds: Vec<u32>,
    /// Teams ordered by descending total. Ties keep the caller's team order.
    pub standings: Vec<Standing>,
    /// Names of the teams sharing the top total, empty while every total is
    /// zero or negative.
    pub winners: Vec<String>,
}

/// Aggregate graded responses into per-round and total scores.
///
/// Ungraded responses count for nothing. Responses landing on a hidden page
/// are silently skipped so a host can retract a round without voiding the
/// rest of the board, but a response pointing at data that no longer exists
/// is an integrity failure and aborts the aggregation.
pub fn compute(
    pages: &[PageEntity],
    questions: &[QuestionEntity],
    teams: &[TeamEntity],
    responses: &[ResponseEntity],
) -> Result<Leaderboard, LeaderboardError> {
    let mut rounds: Vec<u32> = pages
        .iter()
        .filter(|page| !page.hidden)
        .map(|page| page.order)
        .collect();
    rounds.sort_unstable();

    let page_by_id: HashMap<Uuid, &PageEntity> =
        pages.iter().map(|page| (page.id, page)).collect();
    let question_by_id: HashMap<Uuid, &QuestionEntity> =
        questions.iter().map(|question| (question.id, question)).collect();
    let round_index: HashMap<u32, usize> = rounds
        .iter()
        .enumerate()
        .map(|(index, order)| (*order, index))
        .collect();

    // team_id -> per-round tallies
    let mut tallies: HashMap<Uuid, Vec<i32>> = teams
        .iter()
        .map(|team| (team.id, vec![0; rounds.len()]))
        .collect();

    for response in responses {
        if !response.graded {
            continue;
        }
        let question = question_by_id
            .get(&response.question_id)
            .ok_or(LeaderboardError::UnknownQuestion(response.question_id))?;
        let page = page_by_id
            .get(&question.page_id)
            .ok_or(LeaderboardError::UnknownPage(question.page_id))?;
        if page.hidden {
            continue;
        }
        let Some(tally) = tallies.get_mut(&response.team_id) else {
            // Response from a team outside this game's roster; the caller
            // scoped the inputs, so just ignore it.
            continue;
        };
        if let Some(index) = round_index.get(&page.order) {
            tally[*index] += response.score;
        }
    }

    let mut standings: Vec<Standing> = teams
        .iter()
        .map(|team| {
            let by_round = tallies.remove(&team.id).unwrap_or_else(|| vec![0; rounds.len()]);
            let total = by_round.iter().sum();
            Standing {
                team_id: team.id,
                name: team.name.clone(),
                members: team.members.clone(),
                by_round,
                total,
            }
        })
        .collect();
    standings.sort_by_key(|standing| std::cmp::Reverse(standing.total));

    let winners = match standings.first() {
        Some(top) if top.total > 0 => standings
            .iter()
            .take_while(|standing| standing.total == top.total)
            .map(|standing| standing.name.clone())
            .collect(),
        _ => Vec::new(),
    };

    Ok(Leaderboard {
        rounds,
        standings,
        winners,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::PageState;

    fn page(game_id: Uuid, order: u32, hidden: bool) -> PageEntity {
        PageEntity {
            id: Uuid::new_v4(),
            game_id,
            order,
            state: PageState::Scoring,
            title: format!("Round {order}"),
            description: String::new(),
            hidden,
        }
    }

    fn question(page_id: Uuid, order: u32) -> QuestionEntity {
        QuestionEntity {
            id: Uuid::new_v4(),
            page_id,
            order,
            text: String::new(),
            answer: String::new(),
            possible_points: 5,
        }
    }

    fn team(game_id: Uuid, name: &str) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            game_id,
            name: name.to_owned(),
            members: String::new(),
            passcode: "WXYZ246792".to_owned(),
        }
    }

    fn graded(question_id: Uuid, team_id: Uuid, score: i32) -> ResponseEntity {
        ResponseEntity {
            id: Uuid::new_v4(),
            question_id,
            team_id,
            value: "something".to_owned(),
            graded: true,
            score,
        }
    }

    #[test]
    fn totals_accumulate_across_rounds() {
        let game_id = Uuid::new_v4();
        let round_one = page(game_id, 1, false);
        let round_two = page(game_id, 2, false);
        let q1 = question(round_one.id, 1);
        let q2 = question(round_two.id, 1);
        let alpha = team(game_id, "Alpha");
        let beta = team(game_id, "Beta");

        let board = compute(
            &[round_one, round_two],
            &[q1.clone(), q2.clone()],
            &[alpha.clone(), beta.clone()],
            &[
                graded(q1.id, alpha.id, 3),
                graded(q2.id, alpha.id, 2),
                graded(q1.id, beta.id, 4),
            ],
        )
        .unwrap();

        assert_eq!(board.rounds, vec![1, 2]);
        assert_eq!(board.standings[0].name, "Alpha");
        assert_eq!(board.standings[0].by_round, vec![3, 2]);
        assert_eq!(board.standings[0].total, 5);
        assert_eq!(board.standings[1].by_round, vec![4, 0]);
        assert_eq!(board.winners, vec!["Alpha".to_owned()]);
    }

    #[test]
    fn ungraded_responses_count_for_nothing() {
        let game_id = Uuid::new_v4();
        let round = page(game_id, 1, false);
        let q = question(round.id, 1);
        let solo = team(game_id, "Solo");

        let mut ungraded = graded(q.id, solo.id, 3);
        ungraded.graded = false;

        let board = compute(&[round], &[q], &[solo], &[ungraded]).unwrap();
        assert_eq!(board.standings[0].total, 0);
        assert!(board.winners.is_empty());
    }

    #[test]
    fn hidden_pages_are_not_rounds_and_their_scores_are_skipped() {
        let game_id = Uuid::new_v4();
        let visible = page(game_id, 1, false);
        let hidden = page(game_id, 2, true);
        let q_visible = question(visible.id, 1);
        let q_hidden = question(hidden.id, 1);
        let solo = team(game_id, "Solo");

        let board = compute(
            &[visible, hidden],
            &[q_visible.clone(), q_hidden.clone()],
            &[solo.clone()],
            &[
                graded(q_visible.id, solo.id, 2),
                graded(q_hidden.id, solo.id, 10),
            ],
        )
        .unwrap();

        assert_eq!(board.rounds, vec![1]);
        assert_eq!(board.standings[0].total, 2);
    }

    #[test]
    fn tied_teams_all_win() {
        let game_id = Uuid::new_v4();
        let round = page(game_id, 1, false);
        let q = question(round.id, 1);
        let alpha = team(game_id, "Alpha");
        let beta = team(game_id, "Beta");
        let gamma = team(game_id, "Gamma");

        let board = compute(
            &[round],
            &[q.clone()],
            &[alpha.clone(), beta.clone(), gamma.clone()],
            &[
                graded(q.id, alpha.id, 5),
                graded(q.id, beta.id, 5),
                graded(q.id, gamma.id, 1),
            ],
        )
        .unwrap();

        assert_eq!(board.winners, vec!["Alpha".to_owned(), "Beta".to_owned()]);
    }

    #[test]
    fn no_winners_while_every_total_is_zero() {
        let game_id = Uuid::new_v4();
        let round = page(game_id, 1, false);
        let alpha = team(game_id, "Alpha");

        let board = compute(&[round], &[], &[alpha], &[]).unwrap();
        assert!(board.winners.is_empty());
    }

    #[test]
    fn stray_response_is_an_integrity_error() {
        let game_id = Uuid::new_v4();
        let round = page(game_id, 1, false);
        let solo = team(game_id, "Solo");
        let stray_question = Uuid::new_v4();

        let result = compute(
            &[round],
            &[],
            &[solo.clone()],
            &[graded(stray_question, solo.id, 1)],
        );
        assert_eq!(result, Err(LeaderboardError::UnknownQuestion(stray_question)));
    }

    #[test]
    fn ties_keep_roster_order() {
        let game_id = Uuid::new_v4();
        let round = page(game_id, 1, false);
        let first = team(game_id, "Anchovy");
        let second = team(game_id, "Zebra");

        let board = compute(&[round], &[], &[first.clone(), second.clone()], &[]).unwrap();
        assert_eq!(board.standings[0].name, "Anchovy");
        assert_eq!(board.standings[1].name, "Zebra");
    }
}
