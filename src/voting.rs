//! Vote toggle state machine.
//!
//! Per `(voter, message)` there is either no vote or exactly one vote of a given type.
//! `plan` decides which store mutation a request maps to; both repository
//! implementations execute that plan and then recount the message's votes inside the
//! same atomic unit.

use crate::models::{VoteCounts, VoteOutcome, VoteType};

/// The store mutation a vote request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No vote yet: insert one with the requested type.
    Insert(VoteType),
    /// Existing vote of the other type: rewrite its type in place.
    Switch(VoteType),
    /// Existing vote of the same type: delete it.
    Retract,
}

impl VoteTransition {
    pub fn outcome(self) -> VoteOutcome {
        match self {
            VoteTransition::Insert(_) => VoteOutcome::Added,
            VoteTransition::Switch(_) => VoteOutcome::Updated,
            VoteTransition::Retract => VoteOutcome::Removed,
        }
    }
}

pub fn plan(current: Option<VoteType>, requested: VoteType) -> VoteTransition {
    match current {
        None => VoteTransition::Insert(requested),
        Some(existing) if existing == requested => VoteTransition::Retract,
        Some(_) => VoteTransition::Switch(requested),
    }
}

/// Result of an applied vote transition: what happened and the recomputed tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedVote {
    pub outcome: VoteOutcome,
    pub counts: VoteCounts,
}

/// Tallies vote types from the authoritative vote set of one message.
pub fn tally<I>(votes: I) -> VoteCounts
where
    I: IntoIterator<Item = VoteType>,
{
    votes
        .into_iter()
        .fold(VoteCounts::default(), |mut counts, vote_type| {
            match vote_type {
                VoteType::Upvote => counts.upvotes += 1,
                VoteType::Downvote => counts.downvotes += 1,
            }
            counts
        })
}
