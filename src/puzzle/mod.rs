//! Canvas puzzle controller: rendering, input, animation and session wiring.
//!
//! One controller owns the whole game. The grid and session logic live in the
//! pure submodules ([`grid`], [`session`]) so they stay testable without a
//! browser; this module is the DOM-facing shell around them: canvas drawing,
//! pointer hit testing, the clock interval and the tile slide animation.
//!
//! Scheduling model: the clock display is a repeating 200 ms interval whose
//! handle is owned by the controller and always cancelled before a new one is
//! created. The slide animation is a self-rescheduling 10 ms timeout chain;
//! the `Option<Slide>` token doubles as the busy flag the input handler
//! checks, so at most one tile is ever in flight and pending clicks are
//! dropped, not queued.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement, MouseEvent, window,
};

pub mod grid;
pub mod rng;
pub mod session;

use grid::{EMPTY, Grid, MAX_DIMENSION, MIN_DIMENSION};
use rng::Pcg32;
use session::{Outcome, Phase, ResultRecord, Session};

// --- Layout & Palette --------------------------------------------------------

const DEFAULT_DIMENSION: usize = 4;
/// Inset around each tile square, in pixels; clicks inside the gutter miss.
const TILE_PADDING: f64 = 2.0;
/// Label size is this many pixels divided by the grid dimension.
const FONT_BUDGET: f64 = 240.0;

const BACKGROUND: &str = "#d9d9d9";
const TILE_IDLE: &str = "#828282";
const TILE_ACTIVE: &str = "#322a61";
const TILE_WON: &str = "#00a550";
const LABEL_ACTIVE: &str = "#fff";
const LABEL_IDLE: &str = "#d9d9d9";
const LOSS_COLOR: &str = "#d00";

const CLOCK_TICK_MS: i32 = 200;
const ANIM_TICK_MS: i32 = 10;
/// Number of even steps a sliding tile takes to cover its own size.
const ANIM_STEPS: f64 = 25.0;

// --- Animation token ---------------------------------------------------------

/// The single in-flight tile slide. Exists only while a move animates; the
/// swap is committed when the last frame has been drawn.
struct Slide {
    row: usize,
    col: usize,
    // Direction toward the empty slot, each component -1.0, 0.0 or 1.0.
    drow: f64,
    dcol: f64,
    // Offset (px) of the frame currently on screen.
    drawn: f64,
    // Offset (px) the next frame will be drawn at.
    cycles: f64,
}

impl Slide {
    fn new(row: usize, col: usize, drow: i32, dcol: i32) -> Self {
        Self {
            row,
            col,
            drow: drow as f64,
            dcol: dcol as f64,
            drawn: 0.0,
            cycles: 0.0,
        }
    }

    /// Advance one frame. Returns `(erase_offset, draw_offset, done)`: the
    /// offset whose frame must be wiped, the offset to draw at, and whether
    /// the tile has now covered its full size.
    fn frame(&mut self, tile: f64) -> (f64, f64, bool) {
        let erase = self.drawn;
        self.drawn = self.cycles;
        let done = self.drawn >= tile;
        if !done {
            self.cycles = (self.cycles + tile / ANIM_STEPS).min(tile);
        }
        (erase, self.drawn, done)
    }
}

// --- Controller state --------------------------------------------------------

struct Controller {
    ctx: CanvasRenderingContext2d,
    // Square canvas side in px, fixed at mount from the element's client width.
    field: f64,
    dimension: usize,
    tile: f64,
    grid: Grid,
    session: Session,
    animate: bool,
    anim: Option<Slide>,
    clock_handle: Option<i32>,
    clock_start_ms: f64,
}

thread_local! {
    static CONTROLLER: RefCell<Option<Controller>> = RefCell::new(None);
    // Closures handed to setInterval/setTimeout, kept alive here. The clock
    // slot is emptied whenever its interval is cancelled; the slide tick is
    // created once at mount and rescheduled for as long as a Slide exists.
    static CLOCK_TICK: RefCell<Option<Closure<dyn FnMut()>>> = RefCell::new(None);
    static SLIDE_TICK: RefCell<Option<Closure<dyn FnMut()>>> = RefCell::new(None);
}

// --- Mount & event wiring ----------------------------------------------------

pub fn mount() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas: HtmlCanvasElement = doc
        .get_element_by_id("canvas")
        .ok_or_else(|| JsValue::from_str("no #canvas element"))?
        .dyn_into()?;
    // Square field sized from the container-driven client width; later
    // resizes are not tracked.
    let field = canvas.client_width() as f64;
    canvas.set_width(field as u32);
    canvas.set_height(field as u32);

    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    ctx.set_text_baseline("middle");
    ctx.set_text_align("center");
    ctx.set_font(&tile_font(DEFAULT_DIMENSION));

    let controller = Controller {
        ctx,
        field,
        dimension: DEFAULT_DIMENSION,
        tile: field / DEFAULT_DIMENSION as f64,
        grid: Grid::ordered(DEFAULT_DIMENSION),
        session: Session::new(),
        animate: true,
        anim: None,
        clock_handle: None,
        clock_start_ms: 0.0,
    };
    draw_field(&controller);
    CONTROLLER.with(|cell| cell.replace(Some(controller)));
    set_text("dimension", &dimension_label(DEFAULT_DIMENSION));

    {
        let closure = Closure::wrap(Box::new(move |evt: MouseEvent| {
            handle_click(evt.offset_x() as f64, evt.offset_y() as f64);
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    wire_button(&doc, "start", on_start)?;
    wire_button(&doc, "restart", on_restart)?;
    wire_button(&doc, "finish", on_finish)?;
    wire_button(&doc, "switch", on_toggle_animation)?;

    {
        let slider: HtmlInputElement = doc
            .get_element_by_id("slider")
            .ok_or_else(|| JsValue::from_str("no #slider element"))?
            .dyn_into()?;
        let source = slider.clone();
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            on_dimension_input(&source);
        }) as Box<dyn FnMut(_)>);
        slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    SLIDE_TICK.with(|slot| {
        *slot.borrow_mut() = Some(Closure::wrap(Box::new(slide_tick) as Box<dyn FnMut()>));
    });

    log::info!(
        "slide-fifteen mounted: {field}px field, {n}x{n} board",
        n = DEFAULT_DIMENSION
    );
    Ok(())
}

fn wire_button(doc: &Document, id: &str, handler: fn()) -> Result<(), JsValue> {
    let el = doc
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no #{id} element")))?;
    let closure =
        Closure::wrap(Box::new(move |_evt: MouseEvent| handler()) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Input -------------------------------------------------------------------

/// Map canvas-local pointer coordinates to a grid cell. Rejects coordinates
/// outside the field and hits inside a cell's padding gutter.
fn hit_cell(px: f64, py: f64, field: f64, tile: f64, padding: f64) -> Option<(usize, usize)> {
    if px < 0.0 || py < 0.0 || px > field || py > field {
        return None;
    }
    let mod_x = px % tile;
    let mod_y = py % tile;
    let edge = tile - padding;
    if mod_x < padding || mod_x > edge || mod_y < padding || mod_y > edge {
        return None;
    }
    Some(((py / tile) as usize, (px / tile) as usize))
}

fn handle_click(px: f64, py: f64) {
    CONTROLLER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(ctrl) = borrow.as_mut() else { return };
        if ctrl.anim.is_some() || ctrl.session.phase() != Phase::Playing {
            return;
        }
        let Some((row, col)) = hit_cell(px, py, ctrl.field, ctrl.tile, TILE_PADDING) else {
            return;
        };
        if ctrl.grid.value(row, col) == EMPTY {
            return;
        }
        let Some((drow, dcol)) = ctrl.grid.slide_direction(row, col) else {
            return;
        };

        ctrl.session.record_step();
        set_text("steps", &ctrl.session.steps().to_string());
        log::debug!("move {}: tile at ({row}, {col})", ctrl.session.steps());

        if ctrl.animate {
            ctrl.anim = Some(Slide::new(row, col, drow, dcol));
            schedule_slide_tick();
        } else {
            commit_and_check(ctrl, row, col);
            draw_field(ctrl);
        }
    });
}

// --- Move executor -----------------------------------------------------------

/// Commit an already-validated slide, then test for the win condition.
fn commit_and_check(ctrl: &mut Controller, row: usize, col: usize) {
    ctrl.grid.commit_slide(row, col);
    let last = ctrl.dimension - 1;
    if ctrl.grid.empty_pos() == (last, last) && ctrl.grid.is_solved() {
        let clock = current_clock(ctrl);
        if let Some(record) = ctrl.session.declare_win(&clock, ctrl.dimension) {
            stop_clock(ctrl);
            draw_field(ctrl);
            log::info!(
                "game {} won in {} moves ({})",
                record.game,
                record.steps,
                record.clock
            );
            append_result_row(&record).ok();
        }
    }
}

// --- Animation driver --------------------------------------------------------

fn schedule_slide_tick() {
    let Some(win) = window() else { return };
    SLIDE_TICK.with(|slot| {
        if let Some(callback) = slot.borrow().as_ref() {
            win.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                ANIM_TICK_MS,
            )
            .ok();
        }
    });
}

fn slide_tick() {
    let mut reschedule = false;
    CONTROLLER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(ctrl) = borrow.as_mut() else { return };
        let tile = ctrl.tile;
        let Some(slide) = ctrl.anim.as_mut() else { return };
        let (row, col) = (slide.row, slide.col);
        let (drow, dcol) = (slide.drow, slide.dcol);
        let (erase, draw, done) = slide.frame(tile);

        // Wipe the previous frame (full cell square, padding included), then
        // redraw the tile at its new offset.
        ctrl.ctx.set_fill_style_str(BACKGROUND);
        ctrl.ctx.fill_rect(
            col as f64 * tile + dcol * erase,
            row as f64 * tile + drow * erase,
            tile,
            tile,
        );
        draw_tile(ctrl, row, col, dcol * draw, drow * draw);

        if done {
            ctrl.anim = None;
            commit_and_check(ctrl, row, col);
        } else {
            reschedule = true;
        }
    });
    if reschedule {
        schedule_slide_tick();
    }
}

// --- Clock driver ------------------------------------------------------------

/// (Re)start the elapsed-time interval. The previous interval, if any, is
/// always cancelled first so two clocks never run at once.
fn start_clock(ctrl: &mut Controller) {
    stop_clock(ctrl);
    ctrl.clock_start_ms = crate::performance_now();
    let Some(win) = window() else { return };
    let closure = Closure::wrap(Box::new(clock_tick) as Box<dyn FnMut()>);
    match win.set_interval_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        CLOCK_TICK_MS,
    ) {
        Ok(handle) => {
            ctrl.clock_handle = Some(handle);
            CLOCK_TICK.with(|slot| *slot.borrow_mut() = Some(closure));
        }
        Err(_) => drop(closure),
    }
}

fn stop_clock(ctrl: &mut Controller) {
    if let Some(handle) = ctrl.clock_handle.take() {
        if let Some(win) = window() {
            win.clear_interval_with_handle(handle);
        }
        CLOCK_TICK.with(|slot| slot.borrow_mut().take());
    }
}

fn clock_tick() {
    CONTROLLER.with(|cell| {
        let borrow = cell.borrow();
        let Some(ctrl) = borrow.as_ref() else { return };
        set_text("timer", &current_clock(ctrl));
    });
}

fn current_clock(ctrl: &Controller) -> String {
    let secs = ((crate::performance_now() - ctrl.clock_start_ms) / 1000.0).max(0.0) as u64;
    session::format_clock(secs)
}

// --- Session controls --------------------------------------------------------

fn on_start() {
    CONTROLLER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(ctrl) = borrow.as_mut() else { return };
        if !ctrl.session.begin() {
            return;
        }
        let mut rng = Pcg32::from_entropy();
        ctrl.grid = Grid::shuffled(ctrl.dimension, &mut rng);
        start_clock(ctrl);
        draw_field(ctrl);
        set_class("start", "hide", true);
        set_class("restart", "hide", false);
        set_class("finish", "hide", false);
        set_slider_disabled(true);
        log::info!(
            "game {} started ({n}x{n})",
            ctrl.session.game(),
            n = ctrl.dimension
        );
    });
}

fn on_restart() {
    CONTROLLER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(ctrl) = borrow.as_mut() else { return };
        if ctrl.session.phase() == Phase::NotStarted {
            return;
        }
        let clock = current_clock(ctrl);
        if let Some(record) = ctrl.session.restart(&clock, ctrl.dimension) {
            append_result_row(&record).ok();
        }
        ctrl.anim = None;
        let mut rng = Pcg32::from_entropy();
        ctrl.grid = Grid::shuffled(ctrl.dimension, &mut rng);
        start_clock(ctrl);
        set_text("steps", "0");
        draw_field(ctrl);
        log::info!("game {} restarted", ctrl.session.game());
    });
}

fn on_finish() {
    CONTROLLER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(ctrl) = borrow.as_mut() else { return };
        let clock = current_clock(ctrl);
        if let Some(record) = ctrl.session.finish(&clock, ctrl.dimension) {
            append_result_row(&record).ok();
        }
        ctrl.anim = None;
        stop_clock(ctrl);
        ctrl.grid = Grid::ordered(ctrl.dimension);
        set_text("steps", "0");
        set_text("timer", "0:00");
        set_class("start", "hide", false);
        set_class("restart", "hide", true);
        set_class("finish", "hide", true);
        set_slider_disabled(false);
        draw_field(ctrl);
        log::info!("session finished");
    });
}

fn on_dimension_input(slider: &HtmlInputElement) {
    CONTROLLER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(ctrl) = borrow.as_mut() else { return };
        // The slider is disabled while playing; the phase guard also covers
        // programmatic input events.
        if ctrl.session.phase() != Phase::NotStarted {
            return;
        }
        let n = slider
            .value()
            .parse::<usize>()
            .unwrap_or(DEFAULT_DIMENSION)
            .clamp(MIN_DIMENSION, MAX_DIMENSION);
        ctrl.dimension = n;
        ctrl.tile = ctrl.field / n as f64;
        ctrl.ctx.set_font(&tile_font(n));
        ctrl.grid = Grid::ordered(n);
        set_text("dimension", &dimension_label(n));
        draw_field(ctrl);
    });
}

fn on_toggle_animation() {
    CONTROLLER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let Some(ctrl) = borrow.as_mut() else { return };
        // Preference only; an in-flight slide keeps its own token.
        ctrl.animate = !ctrl.animate;
    });
    toggle_class("switch", "switch-on");
}

// --- Rendering ---------------------------------------------------------------

fn draw_field(ctrl: &Controller) {
    ctrl.ctx.set_fill_style_str(BACKGROUND);
    ctrl.ctx.fill_rect(0.0, 0.0, ctrl.field, ctrl.field);
    for row in 0..ctrl.dimension {
        for col in 0..ctrl.dimension {
            if ctrl.grid.value(row, col) != EMPTY {
                draw_tile(ctrl, row, col, 0.0, 0.0);
            }
        }
    }
}

/// Draw one tile; `off_x`/`off_y` displace it in px for animation frames.
fn draw_tile(ctrl: &Controller, row: usize, col: usize, off_x: f64, off_y: f64) {
    let tile = ctrl.tile;
    let x = col as f64 * tile + off_x;
    let y = row as f64 * tile + off_y;
    let fill = match ctrl.session.phase() {
        Phase::Won => TILE_WON,
        Phase::Playing => TILE_ACTIVE,
        Phase::NotStarted => TILE_IDLE,
    };
    ctrl.ctx.set_fill_style_str(fill);
    ctrl.ctx.fill_rect(
        x + TILE_PADDING,
        y + TILE_PADDING,
        tile - 2.0 * TILE_PADDING,
        tile - 2.0 * TILE_PADDING,
    );
    let label = match ctrl.session.phase() {
        Phase::NotStarted => LABEL_IDLE,
        _ => LABEL_ACTIVE,
    };
    ctrl.ctx.set_fill_style_str(label);
    let value = ctrl.grid.value(row, col);
    // small vertical offset keeps the glyph optically centered
    ctrl.ctx
        .fill_text(
            &value.to_string(),
            x + tile / 2.0,
            y + tile / 2.0 + tile / 15.0,
        )
        .ok();
}

fn tile_font(dimension: usize) -> String {
    format!("{}px 'Fira Code', monospace", FONT_BUDGET / dimension as f64)
}

fn dimension_label(dimension: usize) -> String {
    format!("{dimension} x {dimension}")
}

// --- DOM helpers -------------------------------------------------------------

fn document() -> Option<Document> {
    window().and_then(|w| w.document())
}

fn set_text(id: &str, text: &str) {
    if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
        el.set_text_content(Some(text));
    }
}

fn set_class(id: &str, class: &str, on: bool) {
    if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
        let list = el.class_list();
        let result = if on {
            list.add_1(class)
        } else {
            list.remove_1(class)
        };
        result.ok();
    }
}

fn toggle_class(id: &str, class: &str) {
    if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
        el.class_list().toggle(class).ok();
    }
}

fn set_slider_disabled(disabled: bool) {
    if let Some(el) = document().and_then(|d| d.get_element_by_id("slider")) {
        if let Ok(input) = el.dyn_into::<HtmlInputElement>() {
            input.set_disabled(disabled);
        }
    }
}

fn append_result_row(record: &ResultRecord) -> Result<(), JsValue> {
    let doc = document().ok_or_else(|| JsValue::from_str("no document"))?;
    let body = doc
        .get_element_by_id("table_body")
        .ok_or_else(|| JsValue::from_str("no #table_body element"))?;
    let row = doc.create_element("tr")?;
    if record.game % 2 == 0 {
        row.class_list().add_1("even")?;
    }
    let columns = [
        record.game.to_string(),
        record.steps.to_string(),
        record.clock.clone(),
        record.outcome.label().to_owned(),
        dimension_label(record.dimension),
    ];
    for (i, text) in columns.iter().enumerate() {
        let cell = doc.create_element("td")?;
        if i == 3 {
            let color = match record.outcome {
                Outcome::Win => TILE_WON,
                Outcome::Loss => LOSS_COLOR,
            };
            cell.set_attribute("style", &format!("color: {color}"))?;
        }
        cell.set_text_content(Some(text));
        row.append_child(&cell)?;
    }
    body.append_child(&row)?;
    Ok(())
}

#[cfg(feature = "serde_json")]
pub fn results_json() -> String {
    CONTROLLER.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|ctrl| serde_json::to_string(ctrl.session.results()).unwrap_or_default())
            .unwrap_or_else(|| "[]".to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD: f64 = 400.0;
    const TILE: f64 = 100.0;

    #[test]
    fn hit_cell_maps_interior_coordinates() {
        assert_eq!(hit_cell(150.0, 250.0, FIELD, TILE, TILE_PADDING), Some((2, 1)));
        assert_eq!(hit_cell(50.0, 50.0, FIELD, TILE, TILE_PADDING), Some((0, 0)));
        assert_eq!(hit_cell(397.0, 397.0, FIELD, TILE, TILE_PADDING), Some((3, 3)));
    }

    #[test]
    fn hit_cell_rejects_padding_gutter() {
        // 1 px into the second column: inside the left padding band.
        assert_eq!(hit_cell(101.0, 50.0, FIELD, TILE, TILE_PADDING), None);
        // 1 px short of the cell edge: inside the right padding band.
        assert_eq!(hit_cell(199.0, 50.0, FIELD, TILE, TILE_PADDING), None);
        assert_eq!(hit_cell(50.0, 101.0, FIELD, TILE, TILE_PADDING), None);
    }

    #[test]
    fn hit_cell_rejects_out_of_field() {
        assert_eq!(hit_cell(-1.0, 50.0, FIELD, TILE, TILE_PADDING), None);
        assert_eq!(hit_cell(50.0, -0.5, FIELD, TILE, TILE_PADDING), None);
        assert_eq!(hit_cell(401.0, 50.0, FIELD, TILE, TILE_PADDING), None);
        assert_eq!(hit_cell(50.0, 400.0, FIELD, TILE, TILE_PADDING), None);
    }

    #[test]
    fn slide_covers_exactly_one_tile_in_even_steps() {
        let mut slide = Slide::new(1, 2, 0, 1);
        let mut frames = Vec::new();
        loop {
            let (erase, draw, done) = slide.frame(TILE);
            frames.push((erase, draw));
            if done {
                break;
            }
            assert!(frames.len() < 100, "slide never terminated");
        }
        // 26 frames: offsets 0, 4, 8, ..., 100.
        assert_eq!(frames.len(), 26);
        assert_eq!(frames[0], (0.0, 0.0));
        assert_eq!(frames.last().unwrap().1, TILE);
        // Each frame erases exactly what the previous frame drew.
        for pair in frames.windows(2) {
            assert_eq!(pair[1].0, pair[0].1);
        }
    }

    #[test]
    fn slide_direction_components_become_float_offsets() {
        let slide = Slide::new(3, 3, -1, 0);
        assert_eq!((slide.drow, slide.dcol), (-1.0, 0.0));
    }
}
