use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::loader::image_loader::PixelGrid;
use crate::shared::DisplayState;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, preview: &PixelGrid) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Min(8),    // image
            Constraint::Length(3), // knobs
            Constraint::Length(1), // progress
            Constraint::Length(1), // status / help
        ])
        .split(area);

    draw_title(frame, sections[0], state);
    draw_image(frame, sections[1], state, preview);
    draw_knobs(frame, sections[2], state);
    draw_progress(frame, sections[3], state);
    draw_status(frame, sections[4], state);
}

fn draw_title(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mode = if state.blocked {
        Span::styled(" BLOCKED ", Style::default().fg(Color::Black).bg(Color::Red))
    } else if state.playing {
        Span::styled(" PLAYING ", Style::default().fg(Color::Black).bg(Color::Green))
    } else {
        Span::styled(" STOPPED ", Style::default().fg(Color::Black).bg(Color::DarkGray))
    };
    let line = Line::from(vec![
        Span::styled("pixeltone ", Style::default().fg(Color::LightMagenta)),
        mode,
        Span::raw(format!(
            "  {}  {}x{} cells",
            state.image_name, state.grid_w, state.grid_h
        )),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

// one text row carries two pixel rows via the upper-half-block glyph:
// fg paints the top pixel, bg the bottom one
fn draw_image(frame: &mut Frame, area: Rect, state: &DisplayState, preview: &PixelGrid) {
    if preview.width == 0 || preview.height == 0 {
        return;
    }
    let text_rows = preview.height.div_ceil(2).min(area.height as usize);
    let cols = preview.width.min(area.width as usize);
    let x_off = (area.width as usize).saturating_sub(cols) / 2;

    // the cursor lives in grid coordinates; project its cell onto the preview
    let cell = state.cursor.map(|(cx, cy, _)| {
        let sx = preview.width as f32 / state.grid_w.max(1) as f32;
        let sy = preview.height as f32 / state.grid_h.max(1) as f32;
        (
            (cx as f32 * sx) as usize..((cx + 1) as f32 * sx).ceil() as usize,
            (cy as f32 * sy) as usize..((cy + 1) as f32 * sy).ceil() as usize,
        )
    });

    let mut lines = Vec::with_capacity(text_rows);
    for row in 0..text_rows {
        let mut spans = Vec::with_capacity(cols + 1);
        spans.push(Span::raw(" ".repeat(x_off)));
        for x in 0..cols {
            let top = shade(preview.get(x, row * 2), x, row * 2, &cell);
            let bottom = shade(preview.get(x, row * 2 + 1), x, row * 2 + 1, &cell);
            spans.push(Span::styled(
                "\u{2580}",
                Style::default()
                    .fg(Color::Rgb(top[0], top[1], top[2]))
                    .bg(Color::Rgb(bottom[0], bottom[1], bottom[2])),
            ));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

type CellRect = Option<(std::ops::Range<usize>, std::ops::Range<usize>)>;

// pixels under the sweep cursor get pushed toward white
fn shade(rgba: [u8; 4], x: usize, y: usize, cell: &CellRect) -> [u8; 4] {
    match cell {
        Some((xs, ys)) if xs.contains(&x) && ys.contains(&y) => [
            (rgba[0] as u16 + 255).div_ceil(2) as u8,
            (rgba[1] as u16 + 255).div_ceil(2) as u8,
            (rgba[2] as u16 + 255).div_ceil(2) as u8,
            rgba[3],
        ],
        _ => rgba,
    }
}

fn draw_knobs(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let text = format!(
        "vol {:>3.0}%   bpm {:>3.0}   speed {:.1}x   note {:.2}s (step {:.2}s)   \
         stride {}   {}   {}",
        state.volume * 100.0,
        state.bpm,
        state.speed,
        state.note_duration,
        state.effective_duration,
        state.pixel_step,
        state.shape_label,
        state.scale_label,
    );
    let block = Block::default().borders(Borders::TOP | Borders::BOTTOM);
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        area,
    );
}

fn draw_progress(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let gauge = Gauge::default()
        .ratio(state.progress.clamp(0.0, 1.0) as f64)
        .gauge_style(Style::default().fg(Color::LightMagenta).bg(Color::DarkGray))
        .label(format!("{:>3.0}%", state.progress * 100.0));
    frame.render_widget(gauge, area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let text = if state.status_line.is_empty() {
        "space play/stop  [ ] vol  - = bpm  ; ' speed  , . note  1-4 stride  \
         o shape  s scale  r reload  q quit"
            .to_string()
    } else {
        state.status_line.clone()
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
