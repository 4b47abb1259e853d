use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece, Square, EMPTY};

pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(square: Square) -> char {
    (b'a' + square.get_file().to_index() as u8) as char
}

fn rank_char(square: Square) -> char {
    (b'1' + square.get_rank().to_index() as u8) as char
}

/// Standard algebraic notation for a move that is legal on `board`.
pub fn to_san(board: &Board, chess_move: ChessMove) -> String {
    let source = chess_move.get_source();
    let dest = chess_move.get_dest();

    let piece = match board.piece_on(source) {
        Some(piece) => piece,
        None => return chess_move.to_string(),
    };

    let mut san = String::new();
    let file_distance = source.get_file().to_index() as i32 - dest.get_file().to_index() as i32;

    if piece == Piece::King && file_distance.abs() == 2 {
        san.push_str(if file_distance < 0 { "O-O" } else { "O-O-O" });
    } else if piece == Piece::Pawn {
        // en passant lands on an empty square, but still changes file
        if file_distance != 0 {
            san.push(file_char(source));
            san.push('x');
        }
        san.push_str(&dest.to_string());
        if let Some(promotion) = chess_move.get_promotion() {
            san.push('=');
            san.push(piece_letter(promotion));
        }
    } else {
        san.push(piece_letter(piece));
        san.push_str(&disambiguation(board, chess_move, piece));
        if board.piece_on(dest).is_some() {
            san.push('x');
        }
        san.push_str(&dest.to_string());
    }

    let after = board.make_move_new(chess_move);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if *after.checkers() != EMPTY {
        san.push('+');
    }

    san
}

fn disambiguation(board: &Board, chess_move: ChessMove, piece: Piece) -> String {
    let source = chess_move.get_source();
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| other.get_dest() == chess_move.get_dest())
        .map(|other| other.get_source())
        .filter(|other_source| *other_source != source && board.piece_on(*other_source) == Some(piece))
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|rival| rival.get_file() == source.get_file());
    let shares_rank = rivals.iter().any(|rival| rival.get_rank() == source.get_rank());

    match (shares_file, shares_rank) {
        (false, _) => file_char(source).to_string(),
        (true, false) => rank_char(source).to_string(),
        (true, true) => source.to_string(),
    }
}
