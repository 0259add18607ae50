use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// The CHIP-8 screen: 64 columns by 32 rows of single-bit pixels, addressed
/// `[row][col]`. Only the interpreter writes to it; renderers get a reference
/// or a clone.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    /// turn every pixel off
    pub fn clear(&mut self) {
        self.pixels = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    /// 0 or 1; coordinates wrap like sprite drawing does
    pub fn pixel(&self, col: usize, row: usize) -> u8 {
        self.pixels[row % DISPLAY_HEIGHT][col % DISPLAY_WIDTH]
    }

    pub fn rows(&self) -> &[[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT] {
        &self.pixels
    }

    pub fn lit_count(&self) -> usize {
        self.pixels
            .iter()
            .map(|row| row.iter().filter(|p| **p == 1).count())
            .sum()
    }

    /// XOR an 8-pixel-wide sprite onto the screen with its top-left corner at
    /// (`col`, `row`), wrapping on both axes. Each byte of `sprite` is one row,
    /// most significant bit leftmost. Returns true if any lit pixel was turned
    /// off.
    pub fn draw_sprite(&mut self, col: u8, row: u8, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (dy, line) in sprite.iter().enumerate() {
            let y = (row as usize + dy) % DISPLAY_HEIGHT;
            for dx in 0..8 {
                if line & (0x80 >> dx) == 0 {
                    continue;
                }
                let x = (col as usize + dx) % DISPLAY_WIDTH;
                let px = &mut self.pixels[y][x];
                if *px == 1 {
                    collision = true;
                }
                *px ^= 1;
            }
        }
        collision
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.pixels.iter() {
            let line: String = row.iter().map(|p| if *p == 1 { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Display is used by the scheduler to put the frame buffer on a screen. It
/// should abstract the implementation details, so a variety of kinds of screen
/// would work.
pub trait Display {
    /// render a snapshot of the CHIP-8 screen
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error>;
}

// canvas coordinates for the 64x32 grid; y runs downwards so is negated
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    fn bitplane_from_frame<'a>(
        &self,
        frame: &'a FrameBuffer,
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        frame.rows().iter().enumerate().flat_map(move |(y, row)| {
            row.iter()
                .enumerate()
                .filter(move |(_, px)| **px == bitplane)
                .map(move |(x, _)| (x as f64, -1.0 * y as f64))
        })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error> {
        // for now this assumes a 1:1 ratio between terminal cells and chip8
        // pixels
        let resolution = &self.resolution;
        let lit: Vec<_> = resolution.bitplane_from_frame(frame, 1).collect();
        let unlit: Vec<_> = resolution.bitplane_from_frame(frame, 0).collect();
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &unlit,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; remembers what it was given
#[derive(Default)]
pub struct DummyDisplay {
    pub frames_drawn: usize,
    pub last_frame: Option<FrameBuffer>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error> {
        self.frames_drawn += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}
