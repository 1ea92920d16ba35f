use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tube_draw::hand::HandCategory;
use tube_draw::tubes::{
    Contributor, PayoutAttempt, RefillReason, Tube, TubeBalances, TubeLedger,
};

#[test]
fn random_claims_and_refills_keep_the_ledger_balanced() {
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let mut ledger = TubeLedger::new(TubeBalances([5, 10, 15, 20, 25]));
    let mut expected = [5u64, 10, 15, 20, 25];

    for step in 0..5_000 {
        if rng.gen_bool(0.5) {
            let category = HandCategory::ALL[rng.gen_range(0..HandCategory::COUNT)];
            match ledger.attempt_payout(category) {
                PayoutAttempt::NotApplicable => {
                    assert!(Tube::for_category(category).is_none());
                }
                PayoutAttempt::Paid { tube, amount } => {
                    assert_eq!(amount, expected[tube.index()], "step {step}");
                    expected[tube.index()] = 0;
                }
                PayoutAttempt::Bust { tube } => {
                    assert_eq!(expected[tube.index()], 0, "step {step}");
                }
            }
        } else {
            let tube = Tube::ALL[rng.gen_range(0..Tube::ALL.len())];
            let amount = rng.gen_range(0..8);
            let refill = ledger.refill(tube, amount, Contributor::House, RefillReason::Refill);
            assert_eq!(refill.amount, amount);
            expected[tube.index()] += amount;
        }

        ledger.verify().unwrap();
        assert_eq!(ledger.balances(), TubeBalances(expected));
        for tube in Tube::ALL {
            let reserve = ledger.reserve(tube);
            assert_eq!(reserve.funded - reserve.taken, reserve.balance);
        }
    }
}

#[test]
fn payout_winner_takes_the_whole_reserve() {
    let mut ledger = TubeLedger::new(TubeBalances([5, 10, 15, 20, 25]));
    ledger.refill(Tube::RoyalFlush, 7, Contributor::Player(2), RefillReason::Ante);

    assert_eq!(
        ledger.attempt_payout(HandCategory::RoyalFlush),
        PayoutAttempt::Paid {
            tube: Tube::RoyalFlush,
            amount: 32
        }
    );
    assert!(ledger.attempt_payout(HandCategory::RoyalFlush).is_bust());
    let reserve = ledger.reserve(Tube::RoyalFlush);
    assert_eq!((reserve.hits, reserve.busts), (1, 1));
    assert_eq!(ledger.seed(Tube::RoyalFlush), 25);
}

#[test]
fn non_qualifying_hands_never_touch_reserves() {
    let mut ledger = TubeLedger::new(TubeBalances([1, 1, 1, 1, 1]));
    for category in [
        HandCategory::HighCard,
        HandCategory::Pair,
        HandCategory::TwoPair,
        HandCategory::ThreeOfAKind,
        HandCategory::FourOfAKind,
    ] {
        assert_eq!(ledger.attempt_payout(category), PayoutAttempt::NotApplicable);
    }
    assert_eq!(ledger.balances().total(), 5);
}

#[test]
fn lowest_and_threshold_queries() {
    let ledger = TubeLedger::new(TubeBalances([4, 2, 9, 2, 30]));
    assert_eq!(ledger.lowest(), Tube::Flush);
    assert_eq!(ledger.below_threshold(4), vec![Tube::Flush, Tube::StraightFlush]);
    assert!(ledger.below_threshold(0).is_empty());
}
