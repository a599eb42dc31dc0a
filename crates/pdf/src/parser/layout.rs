//! Text extraction and span coalescing.
//!
//! Walks a page's content stream with a simplified text-rendering state
//! machine and turns every show operation into a [`Fragment`].  Fragments are
//! then coalesced, in stream order, into the [`TextSpan`]s the outline
//! heuristics consume.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  Fragment[]  ->  TextSpan[]
//!   (per page)      extract         coalesce
//! ```
//!
//! Spans are never re-sorted by position: the order in which the producer
//! drew the text is the order the outline reports it in.

use outline_core::TextSpan;

use super::backend::{ContentOp, Operand, PageFont, PageId, PdfBackend};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Approximate glyph width as a fraction of font size; no font metrics are
/// read.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Fragments whose baselines differ by at most this much share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Fragments whose font sizes differ by less than this share a span.
const FONT_SIZE_TOLERANCE: f32 = 0.05;

/// Below this gap (points) adjacent fragments are joined without a space.
const MIN_WORD_GAP: f32 = 1.5;

/// Gaps of this many font sizes or more end the span.
const MAX_RUN_GAP_FACTOR: f32 = 2.0;

/// A TJ kerning displacement larger than this fraction of an average glyph is
/// read as a word gap.
const TJ_SPACE_FACTOR: f32 = 0.3;

/// The identity 2x3 matrix: [a, b, c, d, e, f].
const IDENTITY_MATRIX: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

type Matrix = [f32; 6];

/// `m` followed by `n` (PDF row-vector convention).
fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Text drawn by a single show operation, in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Estimated advance width.
    pub width: f32,
    /// Rendered size: the `Tf` size scaled by text matrix and CTM.
    pub font_size: f32,
    pub font_name: String,
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    /// `/F1`-style resource key of the current font.
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    text_matrix: Matrix,
    line_matrix: Matrix,
    /// Current transformation matrix.
    ctm: Matrix,
    /// CTMs saved by `q`.
    ctm_stack: Vec<Matrix>,
    /// Tz / 100.
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            ctm: IDENTITY_MATRIX,
            ctm_stack: Vec::new(),
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Text space to user space.
    fn rendering_matrix(&self) -> Matrix {
        multiply(&self.text_matrix, &self.ctm)
    }

    /// Origin of the next glyph in user space, text rise applied.
    fn origin(&self) -> (f32, f32) {
        let m = self.rendering_matrix();
        (
            self.text_rise * m[2] + m[4],
            self.text_rise * m[3] + m[5],
        )
    }

    /// `font_size * sqrt(b^2 + d^2)` of the rendering matrix.
    fn effective_font_size(&self) -> f32 {
        let m = self.rendering_matrix();
        (self.font_size * (m[1].powi(2) + m[3].powi(2)).sqrt()).abs()
    }

    /// Horizontal scale of the rendering matrix.
    fn horizontal_user_scale(&self) -> f32 {
        let m = self.rendering_matrix();
        (m[0].powi(2) + m[1].powi(2)).sqrt()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td / TD / T*: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn set_font(&mut self, key: Vec<u8>, name: String, size: f32) {
        self.font_key = key;
        self.font_name = name;
        self.font_size = size;
    }

    /// Text-space advance of `text` under the current state.
    fn text_advance(&self, text: &str) -> f32 {
        let glyph = self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale;
        text.chars()
            .map(|ch| {
                let spacing = if ch == ' ' {
                    self.char_spacing + self.word_spacing
                } else {
                    self.char_spacing
                };
                glyph + spacing
            })
            .sum()
    }
}

/// Shared state for one page walk.
struct PageWalker<'a> {
    backend: &'a dyn PdfBackend,
    fonts: Vec<PageFont<'a>>,
    state: TextState,
    fragments: Vec<Fragment>,
}

impl<'a> PageWalker<'a> {
    fn new(backend: &'a dyn PdfBackend, fonts: Vec<PageFont<'a>>) -> Self {
        Self {
            backend,
            fonts,
            state: TextState::default(),
            fragments: Vec::new(),
        }
    }

    fn current_font(&self) -> Option<&PageFont<'a>> {
        self.fonts.iter().find(|f| f.key == self.state.font_key)
    }

    fn decode(&self, operand: &Operand) -> String {
        match operand {
            Operand::Str(bytes) => self.backend.decode_text(self.current_font(), bytes),
            _ => String::new(),
        }
    }

    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            // -- Graphics state -----------------------------------------
            "q" => {
                self.state.ctm_stack.push(self.state.ctm);
            }
            "Q" => {
                if let Some(saved) = self.state.ctm_stack.pop() {
                    self.state.ctm = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(op) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }

            // -- Text objects -------------------------------------------
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "ET" => {}

            "Tf" => self.handle_tf(op),
            "Tm" => {
                if let Some(m) = matrix_operands(op) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => {
                let leading = self.state.leading;
                self.state.translate_line(0.0, -leading);
            }
            "TL" => {
                if let Some(v) = op.number(0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = op.number(0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.number(0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.number(0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.number(0) {
                    self.state.text_rise = v;
                }
            }

            // -- Show text ----------------------------------------------
            "Tj" => {
                if let Some(text) = op.operands.first() {
                    self.show_string(text);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(elements)) = op.operands.first() {
                    self.show_array(elements);
                }
            }
            "'" => {
                let leading = self.state.leading;
                self.state.translate_line(0.0, -leading);
                if let Some(text) = op.operands.first() {
                    self.show_string(text);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    if let Some(aw) = op.number(0) {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = op.number(1) {
                        self.state.char_spacing = ac;
                    }
                    let leading = self.state.leading;
                    self.state.translate_line(0.0, -leading);
                    self.show_string(&op.operands[2]);
                }
            }

            _ => {}
        }
    }

    fn handle_tf(&mut self, op: &ContentOp) {
        let key = match op.operands.first() {
            Some(Operand::Name(n)) | Some(Operand::Str(n)) => n.clone(),
            _ => return,
        };
        let size = op.number(1).unwrap_or(0.0);
        let name = self
            .fonts
            .iter()
            .find(|f| f.key == key)
            .map(PageFont::display_name)
            .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
        self.state.set_font(key, name, size);
    }

    fn show_string(&mut self, operand: &Operand) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let (x, y) = self.state.origin();
        self.push_fragment(text.clone(), x, y);
        let dx = self.state.text_advance(&text);
        self.state.advance_x(dx);
    }

    /// TJ: strings interleaved with kerning adjustments in thousandths of a
    /// text-space unit. Emits a single fragment, with a space wherever the
    /// adjustment is wide enough to be a word gap.
    fn show_array(&mut self, elements: &[Operand]) {
        let mut buf = String::new();
        let (mut x, mut y) = self.state.origin();

        for element in elements {
            match element {
                Operand::Str(_) => {
                    let piece = self.decode(element);
                    if buf.is_empty() {
                        (x, y) = self.state.origin();
                    }
                    let dx = self.state.text_advance(&piece);
                    buf.push_str(&piece);
                    self.state.advance_x(dx);
                }
                Operand::Number(adj) => {
                    let dx = -adj / 1000.0 * self.state.font_size * self.state.horiz_scale;
                    let gap = self.state.font_size
                        * APPROX_CHAR_WIDTH_RATIO
                        * self.state.horiz_scale
                        * TJ_SPACE_FACTOR;
                    if dx > gap && !buf.is_empty() && !buf.ends_with(' ') {
                        buf.push(' ');
                    }
                    self.state.advance_x(dx);
                }
                _ => {}
            }
        }

        let text = buf.trim_end();
        if !text.is_empty() {
            self.push_fragment(text.to_string(), x, y);
        }
    }

    fn push_fragment(&mut self, text: String, x: f32, y: f32) {
        let width = self.state.text_advance(&text) * self.state.horizontal_user_scale();
        self.fragments.push(Fragment {
            text,
            x,
            y,
            width,
            font_size: self.state.effective_font_size(),
            font_name: self.state.font_name.clone(),
        });
    }
}

/// The six numeric operands of `cm` / `Tm`.
fn matrix_operands(op: &ContentOp) -> Option<Matrix> {
    let mut m = [0.0; 6];
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = op.number(i)?;
    }
    Some(m)
}

// ---------------------------------------------------------------------------
// Public API: fragment extraction
// ---------------------------------------------------------------------------

/// Walk a page's content stream and return its text fragments in drawing
/// order.
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` `Q` `cm` | Save / restore / concatenate the CTM |
/// | `BT` `ET` | Begin (reset matrices) / end a text object |
/// | `Tf` | Set font and size |
/// | `Tm` `Td` `TD` `T*` | Position the text matrix |
/// | `TL` `Tc` `Tw` `Tz` `Ts` | Leading, spacing, scaling, rise |
/// | `Tj` `TJ` `'` `"` | Show text |
pub fn extract_page_fragments(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<Fragment>, PdfError> {
    let ops = backend.page_operations(page_id)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|e| {
        log::warn!("Skipping font resources of page {:?}: {}", page_id, e);
        Vec::new()
    });

    let mut walker = PageWalker::new(backend, fonts);
    for op in &ops {
        walker.apply(op);
    }

    Ok(walker.fragments)
}

// ---------------------------------------------------------------------------
// Public API: coalescing
// ---------------------------------------------------------------------------

/// Returns `true` if `c` belongs to a script written without inter-word
/// spaces (CJK, kana, Hangul, Thai and neighbours).
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x20000..=0x2A6DF
            | 0xF900..=0xFAFF
            | 0x3040..=0x30FF
            | 0x31F0..=0x31FF
            | 0xAC00..=0xD7AF
            | 0x1100..=0x11FF
            | 0x3130..=0x318F
            | 0x3000..=0x303F
            | 0xFF00..=0xFFEF
            | 0x0E00..=0x0EFF
            | 0x1000..=0x109F
            | 0x1780..=0x17FF
    )
}

fn same_run(prev: &Fragment, next: &Fragment) -> bool {
    prev.font_name == next.font_name
        && (prev.font_size - next.font_size).abs() < FONT_SIZE_TOLERANCE
        && (prev.y - next.y).abs() <= Y_TOLERANCE
}

fn needs_space(prev: &str, next: &str) -> bool {
    match (prev.chars().next_back(), next.chars().next()) {
        (Some(l), Some(f)) => {
            !l.is_whitespace()
                && !f.is_whitespace()
                && !(is_spaceless_script_char(l) && is_spaceless_script_char(f))
        }
        _ => false,
    }
}

/// Merge consecutive fragments drawn with the same font and size on the same
/// baseline into single spans, keeping drawing order.
///
/// A fragment joins the previous one when the horizontal gap between them is
/// smaller than [`MAX_RUN_GAP_FACTOR`] font sizes (and does not overlap by more
/// than a font size); a space is inserted across gaps of at least
/// [`MIN_WORD_GAP`] points. Spans that end up whitespace-only are dropped.
pub fn coalesce_fragments(fragments: Vec<Fragment>, page_index: usize) -> Vec<TextSpan> {
    let mut runs: Vec<Fragment> = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        if let Some(prev) = runs.last_mut() {
            if same_run(prev, &fragment) {
                let gap = fragment.x - (prev.x + prev.width);
                if gap > -prev.font_size && gap < prev.font_size * MAX_RUN_GAP_FACTOR {
                    if gap >= MIN_WORD_GAP && needs_space(&prev.text, &fragment.text) {
                        prev.text.push(' ');
                    }
                    prev.text.push_str(&fragment.text);
                    prev.width = (fragment.x + fragment.width) - prev.x;
                    continue;
                }
            }
        }
        runs.push(fragment);
    }

    runs.into_iter()
        .filter(|run| !run.text.trim().is_empty())
        .map(|run| TextSpan::new(run.text, run.font_size, run.font_name, page_index))
        .collect()
}

// ---------------------------------------------------------------------------
// Public API: multi-page extraction
// ---------------------------------------------------------------------------

/// Spans for every page, in page-tree order, tagged with zero-based page
/// indices.
pub fn extract_all_pages(backend: &dyn PdfBackend) -> Result<Vec<Vec<TextSpan>>, PdfError> {
    backend
        .pages()
        .values()
        .enumerate()
        .map(|(page_index, &page_id)| {
            let fragments = extract_page_fragments(backend, page_id)?;
            Ok(coalesce_fragments(fragments, page_index))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::backend::decode_text_simple;
    use super::*;

    // -- Helpers ----------------------------------------------------------

    struct MockBackend {
        page_ids: BTreeMap<u32, PageId>,
        fonts: Vec<PageFont<'static>>,
        /// Same operations for every page.
        ops: Vec<ContentOp>,
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            self.page_ids.clone()
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<PageFont<'_>>, PdfError> {
            Ok(self
                .fonts
                .iter()
                .map(|f| PageFont {
                    key: f.key.clone(),
                    base_font: f.base_font.clone(),
                    encoding: None,
                })
                .collect())
        }

        fn page_operations(&self, _page: PageId) -> Result<Vec<ContentOp>, PdfError> {
            Ok(self.ops.clone())
        }

        fn decode_text(&self, _font: Option<&PageFont<'_>>, bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }
    }

    fn backend(ops: Vec<ContentOp>) -> MockBackend {
        MockBackend {
            page_ids: BTreeMap::from([(1, (1, 0))]),
            fonts: vec![
                font(b"F1", "Helvetica"),
                font(b"F2", "ABCDEF+Arial-BoldMT"),
            ],
            ops,
        }
    }

    fn font(key: &[u8], base: &str) -> PageFont<'static> {
        PageFont {
            key: key.to_vec(),
            base_font: Some(base.to_string()),
            encoding: None,
        }
    }

    fn num(v: f32) -> Operand {
        Operand::Number(v)
    }

    fn s(text: &str) -> Operand {
        Operand::Str(text.as_bytes().to_vec())
    }

    fn tf(key: &[u8], size: f32) -> ContentOp {
        ContentOp::new("Tf", vec![Operand::Name(key.to_vec()), num(size)])
    }

    fn tm(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> ContentOp {
        ContentOp::new("Tm", vec![num(a), num(b), num(c), num(d), num(e), num(f)])
    }

    fn td(tx: f32, ty: f32) -> ContentOp {
        ContentOp::new("Td", vec![num(tx), num(ty)])
    }

    fn tj(text: &str) -> ContentOp {
        ContentOp::new("Tj", vec![s(text)])
    }

    fn op(name: &str) -> ContentOp {
        ContentOp::new(name, vec![])
    }

    fn fragment(text: &str, x: f32, y: f32, font_size: f32) -> Fragment {
        Fragment {
            text: text.to_string(),
            x,
            y,
            width: text.chars().count() as f32 * font_size * APPROX_CHAR_WIDTH_RATIO,
            font_size,
            font_name: "Helvetica".to_string(),
        }
    }

    // =====================================================================
    // extract_page_fragments
    // =====================================================================

    #[test]
    fn test_simple_tj() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 12.0),
            tm(1.0, 0.0, 0.0, 1.0, 72.0, 700.0),
            tj("Hello World"),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Hello World");
        assert!((frags[0].x - 72.0).abs() < 0.01);
        assert!((frags[0].y - 700.0).abs() < 0.01);
        assert!((frags[0].font_size - 12.0).abs() < 0.01);
        assert_eq!(frags[0].font_name, "Helvetica");
    }

    #[test]
    fn test_base_font_name_is_reported() {
        let b = backend(vec![op("BT"), tf(b"F2", 18.0), tj("Title"), op("ET")]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags[0].font_name, "ABCDEF+Arial-BoldMT");
    }

    #[test]
    fn test_unknown_font_key_falls_back_to_key() {
        let b = backend(vec![op("BT"), tf(b"F99", 12.0), tj("Text"), op("ET")]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags[0].font_name, "F99");
    }

    #[test]
    fn test_text_matrix_scales_font_size() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 1.0),
            tm(24.0, 0.0, 0.0, 24.0, 72.0, 700.0),
            tj("Scaled"),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert!((frags[0].font_size - 24.0).abs() < 0.01);
    }

    #[test]
    fn test_ctm_scales_font_size_and_is_restored() {
        let b = backend(vec![
            op("q"),
            ContentOp::new(
                "cm",
                vec![num(2.0), num(0.0), num(0.0), num(2.0), num(0.0), num(0.0)],
            ),
            op("BT"),
            tf(b"F1", 9.0),
            td(10.0, 300.0),
            tj("Doubled"),
            op("ET"),
            op("Q"),
            op("BT"),
            tf(b"F1", 9.0),
            td(10.0, 300.0),
            tj("Plain"),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags.len(), 2);
        assert!((frags[0].font_size - 18.0).abs() < 0.01);
        assert!((frags[0].y - 600.0).abs() < 0.01);
        assert!((frags[1].font_size - 9.0).abs() < 0.01);
        assert!((frags[1].y - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_unbalanced_restore_is_ignored() {
        let b = backend(vec![op("Q"), op("BT"), tf(b"F1", 12.0), tj("Still here"), op("ET")]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags.len(), 1);
        assert!((frags[0].font_size - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_td_positioning() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 12.0),
            td(72.0, 700.0),
            tj("First"),
            td(0.0, -14.0),
            tj("Second"),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags.len(), 2);
        assert!((frags[1].y - 686.0).abs() < 0.01);
    }

    #[test]
    fn test_capital_td_sets_leading_for_t_star() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 12.0),
            ContentOp::new("TD", vec![num(72.0), num(-14.0)]),
            tj("Line 1"),
            op("T*"),
            tj("Line 2"),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert!((frags[1].y - (-28.0)).abs() < 0.01);
    }

    #[test]
    fn test_quote_operators_move_to_next_line() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 12.0),
            ContentOp::new("TL", vec![num(14.0)]),
            td(72.0, 700.0),
            tj("Line 1"),
            ContentOp::new("'", vec![s("Line 2")]),
            ContentOp::new("\"", vec![num(0.0), num(0.0), s("Line 3")]),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags.len(), 3);
        assert_eq!(frags[1].text, "Line 2");
        assert!((frags[1].y - 686.0).abs() < 0.01);
        assert_eq!(frags[2].text, "Line 3");
        assert!((frags[2].y - 672.0).abs() < 0.01);
    }

    #[test]
    fn test_tj_array_small_kerning_joins() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 12.0),
            ContentOp::new(
                "TJ",
                vec![Operand::Array(vec![s("Hel"), num(-10.0), s("lo")])],
            ),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Hello");
    }

    #[test]
    fn test_tj_array_large_kerning_inserts_space() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 12.0),
            ContentOp::new(
                "TJ",
                vec![Operand::Array(vec![s("Hello"), num(-500.0), s("World")])],
            ),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags[0].text, "Hello World");
    }

    #[test]
    fn test_empty_strings_are_skipped() {
        let b = backend(vec![op("BT"), tf(b"F1", 12.0), tj(""), tj("Visible"), op("ET")]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Visible");
    }

    #[test]
    fn test_bt_resets_text_matrix() {
        let b = backend(vec![
            op("BT"),
            tf(b"F1", 12.0),
            td(72.0, 700.0),
            tj("First object"),
            op("ET"),
            op("BT"),
            td(72.0, 600.0),
            tj("Second object"),
            op("ET"),
        ]);

        let frags = extract_page_fragments(&b, (1, 0)).unwrap();
        assert!((frags[1].y - 600.0).abs() < 0.01);
    }

    // =====================================================================
    // coalesce_fragments
    // =====================================================================

    #[test]
    fn test_coalesce_word_per_fragment_line() {
        // "Annual" is 6 chars * 6pt = 36pt wide; the next word starts 3pt later.
        let spans = coalesce_fragments(
            vec![
                fragment("Annual", 72.0, 700.0, 12.0),
                fragment("Report", 111.0, 700.0, 12.0),
                fragment("2024", 150.0, 700.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Annual Report 2024");
        assert_eq!(spans[0].page_index, 0);
        assert!((spans[0].font_size - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_coalesce_adjacent_pieces_without_space() {
        let spans = coalesce_fragments(
            vec![
                fragment("Intro", 72.0, 700.0, 12.0),
                fragment("duction", 102.5, 700.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Introduction");
    }

    #[test]
    fn test_coalesce_splits_on_font_size_change() {
        let spans = coalesce_fragments(
            vec![
                fragment("Heading", 72.0, 700.0, 18.0),
                fragment("body", 138.0, 700.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_coalesce_splits_on_font_name_change() {
        let mut bold = fragment("Bold", 110.0, 700.0, 12.0);
        bold.font_name = "Helvetica-Bold".to_string();

        let spans = coalesce_fragments(vec![fragment("Plain", 72.0, 700.0, 12.0), bold], 0);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].font_name, "Helvetica-Bold");
    }

    #[test]
    fn test_coalesce_splits_on_new_line() {
        let spans = coalesce_fragments(
            vec![
                fragment("First line", 72.0, 700.0, 12.0),
                fragment("Second line", 72.0, 686.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_coalesce_splits_on_wide_gap() {
        let spans = coalesce_fragments(
            vec![
                fragment("Left", 72.0, 700.0, 12.0),
                fragment("Right", 400.0, 700.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_coalesce_keeps_drawing_order() {
        // Drawn bottom line first; no positional re-sorting happens.
        let spans = coalesce_fragments(
            vec![
                fragment("Bottom", 72.0, 100.0, 12.0),
                fragment("Top", 72.0, 700.0, 12.0),
            ],
            3,
        );

        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Bottom", "Top"]);
        assert!(spans.iter().all(|s| s.page_index == 3));
    }

    #[test]
    fn test_coalesce_no_double_space() {
        let spans = coalesce_fragments(
            vec![
                fragment("Chapter ", 72.0, 700.0, 12.0),
                fragment("One", 122.0, 700.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans[0].text, "Chapter One");
    }

    #[test]
    fn test_coalesce_cjk_without_space() {
        let spans = coalesce_fragments(
            vec![
                fragment("\u{4E00}", 72.0, 700.0, 12.0),
                fragment("\u{4E01}", 80.0, 700.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans[0].text, "\u{4E00}\u{4E01}");
    }

    #[test]
    fn test_coalesce_drops_whitespace_only() {
        let spans = coalesce_fragments(
            vec![
                fragment("   ", 72.0, 700.0, 12.0),
                fragment("Body", 72.0, 600.0, 12.0),
            ],
            0,
        );

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Body");
    }

    #[test]
    fn test_coalesce_empty() {
        assert!(coalesce_fragments(vec![], 0).is_empty());
    }

    #[test]
    fn test_spaceless_script_chars() {
        assert!(is_spaceless_script_char('\u{4E00}'));
        assert!(is_spaceless_script_char('\u{3042}'));
        assert!(is_spaceless_script_char('\u{AC00}'));
        assert!(is_spaceless_script_char('\u{0E01}'));
        assert!(!is_spaceless_script_char('A'));
        assert!(!is_spaceless_script_char('\u{00E9}'));
    }

    // =====================================================================
    // extract_all_pages
    // =====================================================================

    #[test]
    fn test_extract_all_pages_indexes_from_zero() {
        let b = MockBackend {
            page_ids: BTreeMap::from([(1, (4, 0)), (2, (9, 0))]),
            fonts: vec![font(b"F1", "Helvetica")],
            ops: vec![
                op("BT"),
                tf(b"F1", 14.0),
                tm(1.0, 0.0, 0.0, 1.0, 72.0, 700.0),
                tj("Page heading"),
                op("ET"),
            ],
        };

        let pages = extract_all_pages(&b).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0][0].page_index, 0);
        assert_eq!(pages[1][0].page_index, 1);
        assert_eq!(pages[1][0].text, "Page heading");
    }

    #[test]
    fn test_extract_all_pages_empty_document() {
        let b = MockBackend {
            page_ids: BTreeMap::new(),
            fonts: vec![],
            ops: vec![],
        };

        assert!(extract_all_pages(&b).unwrap().is_empty());
    }

    #[test]
    fn test_text_state_translate_line_cumulative() {
        let mut state = TextState::default();
        state.translate_line(10.0, 20.0);
        state.translate_line(5.0, -3.0);
        assert_eq!(state.origin(), (15.0, 17.0));
    }
}
