use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::types::{LineId, LineRef, MatchId, Side};

static NO_MATCHES: BTreeSet<MatchId> = BTreeSet::new();

/// One server-confirmed association of bank lines with GL lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchGroup {
    pub id: MatchId,

    /// Bank statement lines in this group
    pub bank_ids: BTreeSet<LineId>,

    /// General-ledger lines in this group
    pub gl_ids: BTreeSet<LineId>,
}

impl MatchGroup {
    pub fn new(id: MatchId) -> Self {
        Self {
            id,
            bank_ids: BTreeSet::new(),
            gl_ids: BTreeSet::new(),
        }
    }

    pub fn ids(&self, side: Side) -> &BTreeSet<LineId> {
        match side {
            Side::Bank => &self.bank_ids,
            Side::Gl => &self.gl_ids,
        }
    }

    /// A group needs at least one line on each side to mean anything
    pub fn is_degenerate(&self) -> bool {
        self.bank_ids.is_empty() || self.gl_ids.is_empty()
    }

    /// Every member line, bank side first
    pub fn members(&self) -> impl Iterator<Item = LineRef> + '_ {
        let bank = self.bank_ids.iter().map(|id| LineRef::new(Side::Bank, id.clone()));
        let gl = self.gl_ids.iter().map(|id| LineRef::new(Side::Gl, id.clone()));
        bank.chain(gl)
    }
}

/// A broken correspondence between the groups and the line indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub match_id: MatchId,
    pub line: LineRef,
    /// True when the group lists the line but the index does not
    pub missing_from_index: bool,
}

/// Bidirectional many-to-many index of match groups.
///
/// Groups own their member sets; the two line indices are derived from them
/// and updated in the same call, so no caller can observe them disagreeing.
/// The store only grows: removals happen by discarding it and re-ingesting.
#[derive(Debug, Default)]
pub struct MatchStore {
    /// Index: match ID -> group
    groups: BTreeMap<MatchId, MatchGroup>,

    /// Index: bank line -> groups containing it
    bank_to_matches: HashMap<LineId, BTreeSet<MatchId>>,

    /// Index: GL line -> groups containing it
    gl_to_matches: HashMap<LineId, BTreeSet<MatchId>>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the group for `match_id`, creating an empty one if absent
    pub fn ensure_group(&mut self, match_id: &MatchId) -> &MatchGroup {
        self.groups
            .entry(match_id.clone())
            .or_insert_with(|| MatchGroup::new(match_id.clone()))
    }

    /// Record that `bank_id` and `gl_id` both belong to `match_id`.
    ///
    /// Repeating the same triple leaves the store unchanged.
    pub fn add_relation(&mut self, match_id: &MatchId, bank_id: &LineId, gl_id: &LineId) {
        self.add_member(match_id, Side::Bank, bank_id);
        self.add_member(match_id, Side::Gl, gl_id);
    }

    /// Add every listed line to the group without pairing them up
    pub fn add_members<'a, B, G>(&mut self, match_id: &MatchId, bank_ids: B, gl_ids: G)
    where
        B: IntoIterator<Item = &'a LineId>,
        G: IntoIterator<Item = &'a LineId>,
    {
        self.ensure_group(match_id);
        for id in bank_ids {
            self.add_member(match_id, Side::Bank, id);
        }
        for id in gl_ids {
            self.add_member(match_id, Side::Gl, id);
        }
    }

    /// Add one line to a group, returns true if it was not already a member
    pub fn add_member(&mut self, match_id: &MatchId, side: Side, line_id: &LineId) -> bool {
        let group = self
            .groups
            .entry(match_id.clone())
            .or_insert_with(|| MatchGroup::new(match_id.clone()));
        let (set, index) = match side {
            Side::Bank => (&mut group.bank_ids, &mut self.bank_to_matches),
            Side::Gl => (&mut group.gl_ids, &mut self.gl_to_matches),
        };
        let inserted = set.insert(line_id.clone());
        index
            .entry(line_id.clone())
            .or_default()
            .insert(match_id.clone());
        inserted
    }

    pub fn bank_matches(&self, bank_id: &LineId) -> &BTreeSet<MatchId> {
        self.bank_to_matches.get(bank_id).unwrap_or(&NO_MATCHES)
    }

    pub fn gl_matches(&self, gl_id: &LineId) -> &BTreeSet<MatchId> {
        self.gl_to_matches.get(gl_id).unwrap_or(&NO_MATCHES)
    }

    /// Groups a line belongs to, empty if the line is unmatched
    pub fn matches_for(&self, line: &LineRef) -> &BTreeSet<MatchId> {
        match line.side {
            Side::Bank => self.bank_matches(&line.id),
            Side::Gl => self.gl_matches(&line.id),
        }
    }

    pub fn is_matched(&self, line: &LineRef) -> bool {
        !self.matches_for(line).is_empty()
    }

    pub fn group(&self, match_id: &MatchId) -> Option<&MatchGroup> {
        self.groups.get(match_id)
    }

    /// All groups, ordered by match ID
    pub fn groups(&self) -> impl Iterator<Item = &MatchGroup> {
        self.groups.values()
    }

    /// Every line sharing at least one group with `line`, including itself
    /// when matched. A line in several groups fans out to all of them.
    pub fn paired_lines(&self, line: &LineRef) -> BTreeSet<LineRef> {
        self.matches_for(line)
            .iter()
            .filter_map(|match_id| self.groups.get(match_id))
            .flat_map(MatchGroup::members)
            .collect()
    }

    /// Verify the groups and both indices describe the same memberships.
    /// Returns every violation found; empty means consistent.
    pub fn check_consistency(&self) -> Vec<Inconsistency> {
        let mut problems = Vec::new();

        for group in self.groups.values() {
            for line in group.members() {
                if !self.matches_for(&line).contains(&group.id) {
                    problems.push(Inconsistency {
                        match_id: group.id.clone(),
                        line,
                        missing_from_index: true,
                    });
                }
            }
        }

        let indexed = self
            .bank_to_matches
            .iter()
            .map(|(id, m)| (Side::Bank, id, m))
            .chain(self.gl_to_matches.iter().map(|(id, m)| (Side::Gl, id, m)));
        for (side, line_id, match_ids) in indexed {
            for match_id in match_ids {
                let listed = self
                    .groups
                    .get(match_id)
                    .is_some_and(|g| g.ids(side).contains(line_id));
                if !listed {
                    problems.push(Inconsistency {
                        match_id: match_id.clone(),
                        line: LineRef::new(side, line_id.clone()),
                        missing_from_index: false,
                    });
                }
            }
        }

        problems
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct matched lines on one side
    pub fn matched_line_count(&self, side: Side) -> usize {
        match side {
            Side::Bank => self.bank_to_matches.len(),
            Side::Gl => self.gl_to_matches.len(),
        }
    }
}
