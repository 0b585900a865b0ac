use crate::{NavigatorError, ObjectNavigator, ReferenceResolution};

// ── Mark bits ─────────────────────────────────────────────────────────

/// One bit per object id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkBits {
    words: Vec<u64>,
    count: u64,
}

impl MarkBits {
    pub fn with_capacity(ids: u64) -> Self {
        Self {
            words: vec![0; word_count(ids)],
            count: 0,
        }
    }

    /// Sets the bit for `id`. Returns false if it was already set.
    pub fn mark(&mut self, id: u64) -> bool {
        let (word, bit) = split(id);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_set = self.words[word] & bit != 0;
        self.words[word] |= bit;
        if !was_set {
            self.count += 1;
        }
        !was_set
    }

    pub fn is_marked(&self, id: u64) -> bool {
        let (word, bit) = split(id);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

#[inline]
fn split(id: u64) -> (usize, u64) {
    ((id / 64) as usize, 1 << (id % 64))
}

#[inline]
fn word_count(ids: u64) -> usize {
    ids.div_ceil(64) as usize
}

// ── Marking ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkResult {
    pub marked: MarkBits,
    pub reachable_size: u64,
    /// Referents of soft references that nothing else keeps alive.
    pub softly_reachable_only: u64,
    /// Referents of weak references that nothing else keeps alive.
    pub weakly_reachable_only: u64,
}

impl MarkResult {
    pub fn reachable_count(&self) -> u64 {
        self.marked.count()
    }
}

/// Marks everything strongly reachable from the GC roots.
///
/// Soft and weak referents are not followed. They are collected on the side
/// and counted afterwards if the strong pass never reached them.
pub fn mark_strongly_reachable(
    nav: &mut impl ObjectNavigator,
) -> Result<MarkResult, NavigatorError> {
    let instance_count = nav.instance_count();
    let capacity = instance_count.saturating_add(1);
    let mut marked = MarkBits::with_capacity(capacity);
    let mut soft_referents = MarkBits::with_capacity(capacity);
    let mut weak_referents = MarkBits::with_capacity(capacity);
    let mut reachable_size = 0;

    let roots: Vec<u64> = nav.roots().map(|root| root.id).collect();
    let mut queue = Vec::with_capacity(roots.len());
    for id in roots {
        if id != 0 && marked.mark(checked_id(id, instance_count)?) {
            queue.push(id);
        }
    }

    let mut references = Vec::new();
    // Drain worklist
    while let Some(id) = queue.pop() {
        nav.go_to(id, ReferenceResolution::OnlyStrongReferences)?;
        reachable_size += nav.object_size()?;

        let soft = nav.soft_reference_id();
        if soft != 0 {
            soft_referents.mark(checked_id(soft, instance_count)?);
        }
        let weak = nav.weak_reference_id();
        if weak != 0 {
            weak_referents.mark(checked_id(weak, instance_count)?);
        }

        nav.copy_references_to(&mut references)?;
        for &reference in &references {
            if reference != 0 && marked.mark(checked_id(reference, instance_count)?) {
                queue.push(reference);
            }
        }
    }

    let unreached = |referents: &MarkBits| -> u64 {
        referents
            .words
            .iter()
            .enumerate()
            .map(|(i, &word)| {
                let strong = marked.words.get(i).copied().unwrap_or(0);
                (word & !strong).count_ones() as u64
            })
            .sum()
    };
    let softly_reachable_only = unreached(&soft_referents);
    let weakly_reachable_only = unreached(&weak_referents);

    log::info!(
        "marked {} objects ({} bytes), {} softly and {} weakly reachable only",
        marked.count(),
        reachable_size,
        softly_reachable_only,
        weakly_reachable_only
    );
    Ok(MarkResult {
        marked,
        reachable_size,
        softly_reachable_only,
        weakly_reachable_only,
    })
}

/// Object ids run from 1 to the instance count.
#[inline]
fn checked_id(id: u64, instance_count: u64) -> Result<u64, NavigatorError> {
    if id > instance_count {
        return Err(NavigatorError::IdOutOfRange { id, instance_count });
    }
    Ok(id)
}
