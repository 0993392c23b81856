use flock_lib::{agent::Agent, options::Bounds};

const GREY_SCALE: &str =
    " .\'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// How far up the ramp each additional particle in a cell moves its glyph.
const RAMP_STEP: usize = 10;

/// Character grid the flock is drawn onto, one cell per `width / cols` by
/// `height / rows` patch of the domain. Drawing only reads the agents.
pub struct Canvas {
    cols: usize,
    rows: usize,
    counts: Vec<usize>,
}

impl Canvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Canvas {
            cols,
            rows,
            counts: vec![0; cols * rows],
        }
    }

    fn cell_index(&self, agent: &Agent, bounds: &Bounds) -> usize {
        let col = to_cell(agent.position.x, bounds.width, self.cols);
        let row = to_cell(agent.position.y, bounds.height, self.rows);
        col + row * self.cols
    }

    /// Renders one frame, framed by a border, rows separated by newlines.
    pub fn draw(&mut self, agents: &[Agent], bounds: &Bounds) -> String {
        self.counts.iter_mut().for_each(|c| *c = 0);
        for agent in agents {
            let i = self.cell_index(agent, bounds);
            self.counts[i] += 1;
        }

        let ramp = GREY_SCALE.as_bytes();
        let border = format!("+{}+\n", "-".repeat(self.cols));

        let mut frame = String::with_capacity((self.cols + 3) * (self.rows + 2));
        frame.push_str(&border);
        for row in self.counts.chunks(self.cols) {
            frame.push('|');
            row.iter().for_each(|&count| {
                let level = (count * RAMP_STEP).min(ramp.len() - 1);
                frame.push(ramp[level] as char);
            });
            frame.push_str("|\n");
        }
        frame.push_str(&border);

        frame
    }
}

/// Maps a coordinate onto `0..cells`, clamping anything outside the domain to the edge cells.
fn to_cell(p: f32, extent: f32, cells: usize) -> usize {
    let cell = (p / extent * cells as f32).floor();
    if cell.is_nan() || cell < 0. {
        0
    } else {
        (cell as usize).min(cells - 1)
    }
}
