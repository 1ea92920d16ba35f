use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tube_draw::cards::{Deck, parse_cards};
use tube_draw::hand::{HandCategory, classify};
use tube_draw::strategy::{DEALER, HoldCategory, PLAYER, dealer_decision, player_decision};

#[test]
fn every_hand_gets_exactly_one_valid_decision() {
    let known: HashSet<&str> = PLAYER.rules().map(|rule| rule.id).collect();
    let dealer_known: HashSet<&str> = DEALER.rules().map(|rule| rule.id).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    for _ in 0..20_000 {
        let hand = Deck::shuffled(&mut rng).deal(5).unwrap();
        for decision in [player_decision(&hand).unwrap(), dealer_decision(&hand).unwrap()] {
            assert!(known.contains(decision.id) || dealer_known.contains(decision.id));
            assert!(decision.hold.len() <= 5);
            assert!(decision.hold.iter().all(|&p| p < 5));
            assert!(decision.hold.windows(2).all(|w| w[0] < w[1]), "{:?}", decision.hold);
        }
    }
}

#[test]
fn made_flush_holds_all_five() {
    let decision = player_decision(&parse_cards("2h 9h 5h Kh 7h").unwrap()).unwrap();
    assert_eq!(decision.id, "H5.FL");
    assert_eq!(decision.category, HoldCategory::Hold5);
    assert_eq!(decision.hold, vec![0, 1, 2, 3, 4]);
    assert!(!decision.bust_potential);
}

#[test]
fn single_pair_holds_exactly_the_pair() {
    let cases = [
        ("Kc 2d Kh 7s 9c", vec![0, 2]),
        ("3c 8d 4h Ks Kd", vec![3, 4]),
        ("Kh 6c Jd Ks 2h", vec![0, 3]),
    ];
    for (cards, positions) in cases {
        let hand = parse_cards(cards).unwrap();
        assert_eq!(classify(&hand).unwrap().category, HandCategory::Pair);
        let decision = player_decision(&hand).unwrap();
        assert_eq!(decision.id, "H2.PR", "{cards}");
        assert_eq!(decision.hold, positions, "{cards}");
        assert!(decision.bust_potential);
    }
}

#[test]
fn gapped_suited_four_counts_as_straight_flush_draw() {
    let decision = player_decision(&parse_cards("5s 6s 8s 9s Kd").unwrap()).unwrap();
    assert_eq!(decision.id, "H4.SFD");
    assert_eq!(decision.hold, vec![0, 1, 2, 3]);
}

#[test]
fn lower_priority_holds_follow_the_table() {
    let expectations = [
        ("7c 7d 7h 2s Kc", "H3.TK", vec![0, 1, 2]),
        ("Ad Qd Td 7c 4s", "H3.RFD", vec![0, 1, 2]),
        ("5c 7c 8c Kd 2h", "H3.SFD", vec![0, 1, 2]),
        ("Qh 2c Jh 7d 4s", "H2.SHC", vec![0, 2]),
        ("Kd 2c 9h 7d 4s", "H1.AK", vec![0]),
        ("Kd 2c Ah 7d 4s", "H1.AK", vec![2]),
        ("9d 2c 6h 7d Qs", "H0.ALL", vec![]),
    ];
    for (cards, id, hold) in expectations {
        let decision = player_decision(&parse_cards(cards).unwrap()).unwrap();
        assert_eq!(decision.id, id, "{cards}");
        assert_eq!(decision.hold, hold, "{cards}");
    }
}

#[test]
fn only_made_hands_are_bust_proof() {
    for rule in PLAYER.rules() {
        assert_eq!(
            rule.bust_potential,
            rule.category != HoldCategory::Hold5,
            "{}",
            rule.id
        );
    }
}

#[test]
fn player_rule_order_is_stable() {
    let ids: Vec<&str> = PLAYER.rules().map(|rule| rule.id).collect();
    insta::assert_json_snapshot!(ids, @r###"
    [
      "H5.RF",
      "H5.SF",
      "H5.4K",
      "H5.FH",
      "H5.FL",
      "H5.ST",
      "H4.SFD",
      "H4.FD",
      "H4.OESD",
      "H3.TK",
      "H3.RFD",
      "H3.SFD",
      "H4.TP",
      "H2.PR",
      "H2.SHC",
      "H1.AK",
      "H0.ALL"
    ]
    "###);
}

#[test]
fn dealer_prefers_made_hands_then_draws() {
    let cases = [
        ("9c 9d 9h 4s 4c", "D.PAIR+", vec![0, 1, 2, 3, 4]),
        ("9c 9d 9h 4s Ac", "D.PAIR+", vec![0, 1, 2]),
        ("2h 7h Jh Kh 9c", "D.FD4", vec![0, 1, 2, 3]),
        ("5c 6d 8h 9s Kc", "D.SD4", vec![0, 1, 2, 3]),
    ];
    for (cards, id, hold) in cases {
        let decision = dealer_decision(&parse_cards(cards).unwrap()).unwrap();
        assert_eq!(decision.id, id, "{cards}");
        assert_eq!(decision.hold, hold, "{cards}");
    }
}
