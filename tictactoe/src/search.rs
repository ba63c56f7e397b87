//! Exact game-tree search with alpha-beta pruning.

use tracing::trace;

use crate::board::{Action, Board, Player};

const LOSS: i8 = -2;
const WIN: i8 = 2;

/// The optimal action for the player to move, or `None` on a finished board.
///
/// X maximizes [`Board::utility`], O minimizes it. Among equally good actions
/// the first in row-major order is returned.
pub fn minimax(board: &Board) -> Option<Action> {
    if board.is_terminal() {
        return None;
    }

    let player = board.player();
    let mut nodes = 0;
    let mut best: Option<(Action, i8)> = None;
    for action in board.actions() {
        let child = board.result(action).ok()?;
        // Only a strictly better value can replace the incumbent, so the
        // incumbent's value is a valid window bound for the child search.
        let value = match (player, best) {
            (Player::X, Some((_, v))) => search(&child, v, WIN, &mut nodes),
            (Player::O, Some((_, v))) => search(&child, LOSS, v, &mut nodes),
            (_, None) => search(&child, LOSS, WIN, &mut nodes),
        };
        let improves = match best {
            None => true,
            Some((_, v)) => match player {
                Player::X => value > v,
                Player::O => value < v,
            },
        };
        if improves {
            best = Some((action, value));
        }
    }

    trace!(nodes, ?best, "minimax search");
    best.map(|(action, _)| action)
}

/// The game-theoretic value of `board` under perfect play: +1, 0 or -1.
pub fn evaluate(board: &Board) -> i8 {
    let mut nodes = 0;
    search(board, LOSS, WIN, &mut nodes)
}

fn search(board: &Board, mut alpha: i8, mut beta: i8, nodes: &mut usize) -> i8 {
    *nodes += 1;
    if board.is_terminal() {
        return board.utility();
    }

    let children = board
        .actions()
        .into_iter()
        .filter_map(|action| board.result(action).ok());

    match board.player() {
        Player::X => {
            let mut value = LOSS;
            for child in children {
                value = value.max(search(&child, alpha, beta, nodes));
                alpha = alpha.max(value);
                if alpha >= beta {
                    break;
                }
            }
            value
        }
        Player::O => {
            let mut value = WIN;
            for child in children {
                value = value.min(search(&child, alpha, beta, nodes));
                beta = beta.min(value);
                if alpha >= beta {
                    break;
                }
            }
            value
        }
    }
}
