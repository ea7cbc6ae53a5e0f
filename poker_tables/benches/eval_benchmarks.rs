use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use poker_tables::{
    Action, GameSettings, TableState,
    entities::{Card, SeatRequest, Suit, create_deck, shuffle},
    functional::{argmax, evaluate},
    project,
};

/// Table with `n_players` seated and a hand dealt
fn setup_hand(n_players: usize) -> TableState {
    let mut table = TableState::new(GameSettings {
        small_blind: 10,
        big_blind: 20,
        ..GameSettings::default()
    });
    for seat in 0..n_players {
        table
            .add_seat(SeatRequest {
                player_id: seat as i64,
                seat_number: seat,
                display_name: format!("player{seat}"),
                photo_url: None,
                buy_in: 1000,
            })
            .unwrap();
    }
    table.start_new_hand().unwrap();
    table
}

/// Benchmark evaluation of a flop (5 cards, one subset)
fn bench_evaluate_5_cards(c: &mut Criterion) {
    let hole = [Card::new(14, Suit::Spades), Card::new(13, Suit::Spades)];
    let board = [
        Card::new(12, Suit::Hearts),
        Card::new(7, Suit::Clubs),
        Card::new(2, Suit::Diamonds),
    ];

    c.bench_function("evaluate_5_cards", |b| {
        b.iter(|| evaluate(&hole, &board));
    });
}

/// Benchmark evaluation of a full board (7 cards, 21 subsets)
fn bench_evaluate_7_cards(c: &mut Criterion) {
    let hole = [Card::new(14, Suit::Spades), Card::new(13, Suit::Spades)];
    let board = [
        Card::new(12, Suit::Spades),
        Card::new(11, Suit::Spades),
        Card::new(10, Suit::Spades),
        Card::new(2, Suit::Hearts),
        Card::new(3, Suit::Diamonds),
    ];

    c.bench_function("evaluate_7_cards", |b| {
        b.iter(|| evaluate(&hole, &board));
    });
}

/// Benchmark picking showdown winners at different table sizes
fn bench_showdown_winners(c: &mut Criterion) {
    let mut group = c.benchmark_group("showdown_winners");

    for n_players in [2, 6, 9] {
        let deck = shuffle(&create_deck());
        let board = &deck[..5];
        let hands: Vec<&[Card]> = deck[5..5 + 2 * n_players].chunks(2).collect();

        group.bench_with_input(BenchmarkId::from_parameter(n_players), &n_players, |b, _| {
            b.iter(|| {
                let results: Vec<_> = hands.iter().map(|hole| evaluate(hole, board)).collect();
                argmax(&results)
            });
        });
    }

    group.finish();
}

/// Benchmark building a per-viewer projection
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for n_players in [2, 6, 9] {
        let table = setup_hand(n_players);
        group.bench_with_input(BenchmarkId::from_parameter(n_players), &table, |b, table| {
            b.iter(|| project(table, 1, Some(0), 30));
        });
    }

    group.finish();
}

/// Benchmark dealing a hand and folding it out
fn bench_fold_out_hand(c: &mut Criterion) {
    c.bench_function("fold_out_hand_6_players", |b| {
        b.iter(|| {
            let mut table = setup_hand(6);
            while let Some(seat) = table.current_turn() {
                table.handle_action(seat, Action::Fold).unwrap();
            }
            table.drain_events()
        });
    });
}

criterion_group!(
    hand_evaluation,
    bench_evaluate_5_cards,
    bench_evaluate_7_cards,
    bench_showdown_winners,
);

criterion_group!(table_operations, bench_projection, bench_fold_out_hand);

criterion_main!(hand_evaluation, table_operations);
