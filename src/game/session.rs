#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CardPhase {
    #[default]
    Hidden,
    Flipped,
    NameRevealed,
}

#[derive(Clone, Debug, Default)]
pub struct Card {
    pub phase: CardPhase,
    /// Assigned when the card flips, counted from 1.
    pub image_index: Option<usize>,
    pub name_index: Option<usize>,
    pub name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    OutOfRange,
    AwaitingOtherCard,
    NameAlreadyShown,
    FlipInFlight,
    AlreadyFlipped,
    AllFlipped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Flipped {
        card: usize,
        image_index: usize,
    },
    NameRevealed {
        card: usize,
        name_index: Option<usize>,
        name: Option<String>,
    },
    Ignored(IgnoreReason),
}

/// One round of the reveal game.
///
/// Only one card is ever in motion: `is_flipping` covers the flip
/// animation, and afterwards `active_card` holds the card waiting for its
/// name click. Everything else ignores clicks until both are clear.
#[derive(Clone, Debug)]
pub struct Session {
    cards: Vec<Card>,
    image_count: usize,
    names: Vec<String>,
    next_image_index: usize,
    flipped_cards_count: usize,
    is_flipping: bool,
    active_card: Option<usize>,
    game_id: u64,
}

impl Session {
    pub fn new(card_count: usize, image_count: usize, names: Vec<String>) -> Self {
        Session {
            cards: vec![Card::default(); card_count],
            image_count: image_count.max(1),
            names,
            next_image_index: 1,
            flipped_cards_count: 0,
            is_flipping: false,
            active_card: None,
            game_id: 0,
        }
    }

    pub fn reset(&mut self) {
        self.game_id = self.game_id.wrapping_add(1);
        for card in &mut self.cards {
            *card = Card::default();
        }
        self.next_image_index = 1;
        self.flipped_cards_count = 0;
        self.is_flipping = false;
        self.active_card = None;
    }

    pub fn click(&mut self, index: usize) -> ClickOutcome {
        if index >= self.cards.len() {
            return ClickOutcome::Ignored(IgnoreReason::OutOfRange);
        }

        if self.active_card == Some(index) {
            return self.reveal_name(index);
        }
        if self.active_card.is_some() {
            return ClickOutcome::Ignored(IgnoreReason::AwaitingOtherCard);
        }

        let phase = self.cards[index].phase;
        match phase {
            CardPhase::NameRevealed => ClickOutcome::Ignored(IgnoreReason::NameAlreadyShown),
            _ if self.is_flipping => ClickOutcome::Ignored(IgnoreReason::FlipInFlight),
            CardPhase::Flipped => ClickOutcome::Ignored(IgnoreReason::AlreadyFlipped),
            CardPhase::Hidden if self.flipped_cards_count >= self.image_count => {
                ClickOutcome::Ignored(IgnoreReason::AllFlipped)
            }
            CardPhase::Hidden => self.flip(index),
        }
    }

    fn flip(&mut self, index: usize) -> ClickOutcome {
        self.is_flipping = true;
        let image_index = self.next_image_index;
        let card = &mut self.cards[index];
        card.phase = CardPhase::Flipped;
        card.image_index = Some(image_index);
        self.next_image_index = self.next_image_index % self.image_count + 1;
        self.flipped_cards_count += 1;
        log::debug!(
            "card {index} flipped to image {image_index} ({}/{})",
            self.flipped_cards_count,
            self.image_count
        );
        ClickOutcome::Flipped {
            card: index,
            image_index,
        }
    }

    /// Releases the flip lock once the animation delay has passed. Unless
    /// every image is out, `index` becomes the card awaiting its name click.
    pub fn finish_flip(&mut self, index: usize) -> bool {
        if !self.is_flipping {
            return false;
        }
        self.is_flipping = false;
        if self.flipped_cards_count < self.image_count && index < self.cards.len() {
            self.active_card = Some(index);
            true
        } else {
            false
        }
    }

    fn reveal_name(&mut self, index: usize) -> ClickOutcome {
        let name_index = self.current_name_index();
        let name = name_index.and_then(|i| self.names.get(i).cloned());
        if name.is_none() {
            log::warn!(
                "no name for card {index} (image counter at {})",
                self.next_image_index()
            );
        }
        let card = &mut self.cards[index];
        card.phase = CardPhase::NameRevealed;
        card.name_index = name_index;
        card.name = name.clone();
        self.active_card = None;
        ClickOutcome::NameRevealed {
            card: index,
            name_index,
            name,
        }
    }

    /// Name slot for the image most recently handed out. The last image of
    /// the cycle lands one before the start of the list and has no name.
    fn current_name_index(&self) -> Option<usize> {
        if self.names.is_empty() {
            return None;
        }
        let image_count = self.image_count as i64;
        let current = (self.next_image_index as i64 - 1 + image_count) % image_count;
        let name_index = current % self.names.len() as i64 - 1;
        usize::try_from(name_index)
            .ok()
            .filter(|&i| i < self.names.len())
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn image_count(&self) -> usize {
        self.image_count
    }

    pub fn next_image_index(&self) -> usize {
        self.next_image_index
    }

    pub fn flipped_count(&self) -> usize {
        self.flipped_cards_count
    }

    pub fn is_flipping(&self) -> bool {
        self.is_flipping
    }

    pub fn active_card(&self) -> Option<usize> {
        self.active_card
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    /// No card can change any more.
    pub fn is_complete(&self) -> bool {
        if self.is_flipping || self.active_card.is_some() {
            return false;
        }
        self.flipped_cards_count >= self.image_count
            || self
                .cards()
                .iter()
                .all(|card| card.phase == CardPhase::NameRevealed)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn names() -> Vec<String> {
        ["Trang", "Hà", "Ngân", "Huyền", "Trâm", ""]
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    fn session() -> Session {
        Session::new(6, 6, names())
    }

    #[test]
    fn first_click_flips_and_locks() {
        let mut s = session();
        assert_eq!(
            s.click(2),
            ClickOutcome::Flipped {
                card: 2,
                image_index: 1
            }
        );
        assert_eq!(s.card(2).map(|c| c.phase), Some(CardPhase::Flipped));
        assert_eq!(s.flipped_count(), 1);
        assert!(s.is_flipping());

        assert_eq!(s.click(2), ClickOutcome::Ignored(IgnoreReason::FlipInFlight));
        assert_eq!(s.click(3), ClickOutcome::Ignored(IgnoreReason::FlipInFlight));
        assert_eq!(s.flipped_count(), 1);
        assert_eq!(s.card(3).map(|c| c.phase), Some(CardPhase::Hidden));
    }

    #[test]
    fn second_click_reveals_name_after_animation() {
        let mut s = session();
        s.click(0);
        assert!(s.finish_flip(0));
        assert_eq!(s.active_card(), Some(0));

        assert_eq!(
            s.click(1),
            ClickOutcome::Ignored(IgnoreReason::AwaitingOtherCard)
        );
        assert_eq!(
            s.click(0),
            ClickOutcome::NameRevealed {
                card: 0,
                name_index: Some(0),
                name: Some("Trang".to_string()),
            }
        );
        assert_eq!(s.active_card(), None);
        assert_eq!(s.card(0).map(|c| c.phase), Some(CardPhase::NameRevealed));
        assert_eq!(
            s.click(0),
            ClickOutcome::Ignored(IgnoreReason::NameAlreadyShown)
        );
    }

    #[test]
    fn image_indices_cycle_in_click_order() {
        let mut s = session();
        let mut seen = Vec::new();
        for card in 0..6 {
            match s.click(card) {
                ClickOutcome::Flipped { image_index, .. } => seen.push(image_index),
                other => panic!("unexpected {other:?}"),
            }
            if s.finish_flip(card) {
                s.click(card);
            }
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(s.next_image_index(), 1);
    }

    #[test]
    fn names_follow_image_order() {
        let mut s = session();
        let mut revealed = Vec::new();
        for card in 0..5 {
            s.click(card);
            assert!(s.finish_flip(card));
            if let ClickOutcome::NameRevealed { name, .. } = s.click(card) {
                revealed.push(name);
            }
        }
        let expected: Vec<Option<String>> = names()[..5].iter().cloned().map(Some).collect();
        assert_eq!(revealed, expected);
    }

    #[test]
    fn last_flip_does_not_await_a_name() {
        let mut s = session();
        for card in 0..5 {
            s.click(card);
            s.finish_flip(card);
            s.click(card);
        }
        s.click(5);
        assert!(!s.finish_flip(5));
        assert_eq!(s.active_card(), None);
        assert_eq!(s.flipped_count(), 6);
        assert!(s.is_complete());
        assert_eq!(s.click(5), ClickOutcome::Ignored(IgnoreReason::AlreadyFlipped));
    }

    #[test]
    fn no_flip_after_image_count_reached() {
        let mut s = Session::new(5, 3, names());
        for card in 0..3 {
            s.click(card);
            if s.finish_flip(card) {
                s.click(card);
            }
        }
        assert_eq!(s.flipped_count(), 3);
        assert_eq!(s.click(3), ClickOutcome::Ignored(IgnoreReason::AllFlipped));
        assert_eq!(s.card(3).map(|c| c.phase), Some(CardPhase::Hidden));
        assert!(s.is_complete());
    }

    #[test]
    fn short_name_list_leaves_gaps() {
        let short: Vec<String> = ["A", "B", "C"].iter().map(|n| n.to_string()).collect();
        let mut s = Session::new(6, 6, short);
        let mut revealed = Vec::new();
        for card in 0..5 {
            s.click(card);
            assert!(s.finish_flip(card));
            if let ClickOutcome::NameRevealed { name, .. } = s.click(card) {
                revealed.push(name);
            }
        }
        let expected = [Some("A"), Some("B"), None, Some("A"), Some("B")];
        let expected: Vec<Option<String>> =
            expected.iter().map(|n| n.map(str::to_string)).collect();
        assert_eq!(revealed, expected);

        let mut s = Session::new(3, 3, vec!["Solo".to_string()]);
        s.click(0);
        s.finish_flip(0);
        assert_eq!(
            s.click(0),
            ClickOutcome::NameRevealed {
                card: 0,
                name_index: None,
                name: None,
            }
        );
    }

    #[test]
    fn out_of_range_click_is_ignored() {
        let mut s = session();
        assert_eq!(s.click(6), ClickOutcome::Ignored(IgnoreReason::OutOfRange));
        assert_eq!(s.flipped_count(), 0);
    }

    #[test]
    fn finish_without_flip_is_noop() {
        let mut s = session();
        assert!(!s.finish_flip(0));
        assert_eq!(s.active_card(), None);
    }

    #[test]
    fn reset_hides_everything() {
        let mut s = session();
        s.click(0);
        s.finish_flip(0);
        s.click(0);
        s.click(1);
        let before = s.game_id();

        s.reset();
        assert_ne!(s.game_id(), before);
        assert!(s.cards().iter().all(|c| c.phase == CardPhase::Hidden));
        assert!(s.cards().iter().all(|c| c.image_index.is_none()));
        assert_eq!(s.flipped_count(), 0);
        assert_eq!(s.next_image_index(), 1);
        assert!(!s.is_flipping());
        assert_eq!(s.active_card(), None);
        // A timer from the previous round must not arm a card.
        assert!(!s.finish_flip(1));
    }

    #[derive(Clone, Debug)]
    enum Action {
        Click(usize),
        FinishFlip,
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            3 => (0usize..8).prop_map(Action::Click),
            1 => Just(Action::FinishFlip),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_click_sequence(
            card_count in 1usize..8,
            image_count in 1usize..8,
            actions in proptest::collection::vec(action(), 0..64),
        ) {
            let mut s = Session::new(card_count, image_count, names());
            let mut clicked = vec![false; card_count];
            let mut last_flipped = None;

            for action in actions {
                match action {
                    Action::Click(index) => {
                        let flipped_before = s.flipped_count();
                        let was_hidden = s.card(index).map(|c| c.phase) == Some(CardPhase::Hidden);
                        let outcome = s.click(index);
                        if index < card_count {
                            clicked[index] = true;
                        }
                        match outcome {
                            ClickOutcome::Flipped { card, image_index } => {
                                prop_assert!(was_hidden);
                                prop_assert_eq!(s.flipped_count(), flipped_before + 1);
                                prop_assert!((1..=image_count).contains(&image_index));
                                last_flipped = Some(card);
                            }
                            _ => prop_assert_eq!(s.flipped_count(), flipped_before),
                        }
                    }
                    Action::FinishFlip => {
                        if let Some(card) = last_flipped {
                            s.finish_flip(card);
                        }
                    }
                }

                prop_assert!(s.flipped_count() <= image_count);
                let shown = s
                    .cards()
                    .iter()
                    .filter(|c| c.phase != CardPhase::Hidden)
                    .count();
                prop_assert_eq!(shown, s.flipped_count());
                prop_assert!(!(s.is_flipping() && s.active_card().is_some()));
                if let Some(active) = s.active_card() {
                    prop_assert_eq!(s.card(active).map(|c| c.phase), Some(CardPhase::Flipped));
                }
                for (index, card) in s.cards().iter().enumerate() {
                    if card.phase == CardPhase::NameRevealed {
                        prop_assert!(clicked[index]);
                    }
                }
            }
        }
    }
}
