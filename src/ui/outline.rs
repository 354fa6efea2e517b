//! Land outline drawn under the city markers.
//!
//! The outline is a small SVG path in viewbox units. Only the commands it
//! uses are understood: `M/m`, `L/l`, `H/h`, `V/v` and `Z/z`.

use crate::core::geo::Point;
use once_cell::sync::Lazy;

pub const ITALY_LAND_PATH: &str = "M339 0 l-10 15 -14 2 -6 10 -15 11h-16l-4 13 -13 6 -4 -13 -13 -6 -13 10 -10 -2 -14 -11 -3 -15 -12 -5 -10 10 -10 -2 -10 14 -13 -5 -9 15 -12 2 -4 13 -9 5 -12 -5 -9 17 -15 15 -7 18 2 11 -6 6 5 18 10 20 12 11 15 25 10 16 16 35 15 28 5 8 18 25 15 24 10 10 20 45 10 10 5 -5 10 -5 10 10 10 12 -3 15 10 2 10 -10 10 -10 8 5 -15 20 -25 2 -12 -12 -12 -4 -10 8 -20 10 -12 12 -2 15 10 22 -30 18 -10 18 15 12 25 2 15 -15 12 -2 -5 -15 -2 -10 10 -15 12 -10 10 -10 2 -10 -15 -10 -25 -20 -15 -12 -12 -10 -15 2 -15 -10 -12 10 -10 -15 -10 -10 -10 5 -10 -2 -15 10 -25 5 -10 -10 -20 -10 -35z M180 348 l-20 20 -10 30 -5 20 2 15 15 12 18 5 20 -2 15 -10 8 -20 -2 -15 -10 -20 -12 -18 -15 -12z M310 515 l-15 15 -35 8 -30 -5 -15 -15 -5 -20 10 -15 25 -5 30 5 20 10 10 15z";

/// Mainland, Sardinia and Sicily as closed rings
pub static ITALY_OUTLINE: Lazy<Vec<Vec<Point>>> = Lazy::new(|| parse_path(ITALY_LAND_PATH));

/// Land fill for [`ITALY_OUTLINE`] in one-unit strips
pub static ITALY_FILL: Lazy<Vec<Span>> = Lazy::new(|| scanline_spans(&ITALY_OUTLINE, 1.0));

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

fn tokenize(path: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut number = String::new();

    let flush = |number: &mut String, tokens: &mut Vec<Token>| {
        if !number.is_empty() {
            if let Ok(value) = number.parse() {
                tokens.push(Token::Number(value));
            }
            number.clear();
        }
    };

    for c in path.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            '-' => {
                flush(&mut number, &mut tokens);
                number.push(c);
            }
            c if c.is_ascii_alphabetic() => {
                flush(&mut number, &mut tokens);
                tokens.push(Token::Command(c));
            }
            _ => flush(&mut number, &mut tokens),
        }
    }
    flush(&mut number, &mut tokens);
    tokens
}

/// Parses a path into rings of absolute points. An unpaired coordinate is
/// skipped; an unsupported command ends parsing.
pub fn parse_path(path: &str) -> Vec<Vec<Point>> {
    let tokens = tokenize(path);
    let mut rings = Vec::new();
    let mut ring: Vec<Point> = Vec::new();
    let mut cursor = Point::new(0.0, 0.0);
    let mut start = cursor;
    let mut command = 'M';
    let mut i = 0;

    let number = |i: usize| match tokens.get(i) {
        Some(Token::Number(value)) => Some(*value),
        _ => None,
    };

    while i < tokens.len() {
        if let Token::Command(c) = tokens[i] {
            command = c;
            i += 1;
            if matches!(c, 'z' | 'Z') {
                if ring.len() > 2 {
                    rings.push(std::mem::take(&mut ring));
                } else {
                    ring.clear();
                }
                cursor = start;
            }
            continue;
        }

        match command {
            'M' | 'm' | 'L' | 'l' => {
                let (Some(x), Some(y)) = (number(i), number(i + 1)) else {
                    // Unpaired coordinate
                    i += 1;
                    continue;
                };
                i += 2;
                cursor = if command.is_ascii_uppercase() {
                    Point::new(x, y)
                } else {
                    Point::new(cursor.x + x, cursor.y + y)
                };
                if matches!(command, 'M' | 'm') {
                    if ring.len() > 2 {
                        rings.push(std::mem::take(&mut ring));
                    }
                    ring.clear();
                    start = cursor;
                    // Further pairs after a move are line segments
                    command = if command == 'M' { 'L' } else { 'l' };
                }
                ring.push(cursor);
            }
            'H' | 'h' => {
                let Some(x) = number(i) else { break };
                i += 1;
                cursor.x = if command == 'H' { x } else { cursor.x + x };
                ring.push(cursor);
            }
            'V' | 'v' => {
                let Some(y) = number(i) else { break };
                i += 1;
                cursor.y = if command == 'V' { y } else { cursor.y + y };
                ring.push(cursor);
            }
            other => {
                log::warn!("unsupported path command {other:?}");
                break;
            }
        }
    }

    if ring.len() > 2 {
        rings.push(ring);
    }
    rings
}

/// Horizontal strip of land, in viewbox units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub y0: f64,
    pub y1: f64,
    pub x0: f64,
    pub x1: f64,
}

impl Span {
    pub fn area(&self) -> f64 {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

/// Shoelace area; the sign follows the ring's winding
pub fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

/// Even-odd fill of `rings` as strips `step` units tall, sampled at each
/// strip's middle. Self-intersecting rings are fine.
pub fn scanline_spans(rings: &[Vec<Point>], step: f64) -> Vec<Span> {
    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    if step.is_nan() || step <= 0.0 || min_y >= max_y {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut crossings = Vec::new();
    let mut y0 = min_y;
    while y0 < max_y {
        let y1 = (y0 + step).min(max_y);
        let y = (y0 + y1) / 2.0;

        crossings.clear();
        for ring in rings {
            let n = ring.len();
            for i in 0..n {
                let (a, b) = (ring[i], ring[(i + 1) % n]);
                // Half-open so a vertex on the scanline counts once
                if (a.y <= y) != (b.y <= y) {
                    crossings.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        spans.extend(
            crossings
                .chunks_exact(2)
                .map(|pair| Span { y0, y1, x0: pair[0], x1: pair[1] }),
        );
        y0 = y1;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_with_packed_numbers() {
        let rings = parse_path("M10 0 l-10 15 5 5h-16l-4 13z");
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring[0], Point::new(10.0, 0.0));
        assert_eq!(ring[1], Point::new(0.0, 15.0));
        assert_eq!(ring[2], Point::new(5.0, 20.0));
        assert_eq!(ring[3], Point::new(-11.0, 20.0));
        assert_eq!(ring[4], Point::new(-15.0, 33.0));
    }

    #[test]
    fn test_outline_has_three_islands_in_viewbox() {
        assert_eq!(ITALY_OUTLINE.len(), 3);
        for ring in ITALY_OUTLINE.iter() {
            for point in ring {
                assert!((-50.0..=550.0).contains(&point.x), "{point:?}");
                assert!((-50.0..=750.0).contains(&point.y), "{point:?}");
            }
        }
        assert_eq!(ITALY_OUTLINE[1][0], Point::new(180.0, 348.0));
    }

    #[test]
    fn test_unpaired_coordinate_skipped() {
        let rings = parse_path("M0 0 l10 0 0 10 -35z M50 50 l5 0 0 5z");
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 3);
        assert_eq!(rings[1][0], Point::new(50.0, 50.0));
    }

    fn fill_area(rings: &[Vec<Point>], step: f64) -> f64 {
        scanline_spans(rings, step).iter().map(Span::area).sum()
    }

    #[test]
    fn test_concave_ring_fill() {
        // L shape
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        assert_eq!(signed_area(&ring).abs(), 7.0);
        assert!((fill_area(&[ring.clone()], 0.5) - 7.0).abs() < 1e-9);

        let spans = scanline_spans(&[ring], 1.0);
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0], Span { y0: 0.0, y1: 1.0, x0: 0.0, x1: 4.0 });
        assert_eq!(spans[3].x1, 1.0);
    }

    #[test]
    fn test_island_fill_close_to_area() {
        for ring in &ITALY_OUTLINE[1..] {
            let expected = signed_area(ring).abs();
            let filled = fill_area(&[ring.clone()], 1.0);
            assert!((filled - expected).abs() < expected * 0.02, "{filled} vs {expected}");
        }
        assert!(!ITALY_FILL.is_empty());
        assert!(ITALY_FILL.iter().all(|span| span.x0 <= span.x1));
    }

    #[test]
    fn test_degenerate_rings_dropped() {
        assert!(parse_path("M0 0 l1 1z").is_empty());
        assert!(parse_path("").is_empty());
    }
}
