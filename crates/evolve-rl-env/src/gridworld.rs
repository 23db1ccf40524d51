//! Stochastic 5x5 gridworld with obstacles, water and a goal cell

use serde::{Deserialize, Serialize};
use tracing::trace;

use evolve_rl_core::{Action, Environment, RLError, RandomSource, Result, State};

/// Grid cell as `(x, y)` with `y` growing downwards
pub type Cell = (usize, usize);

/// Gridworld layout, rewards and noise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridworldConfig {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Cells the agent can never enter
    pub obstacles: Vec<Cell>,
    /// Initial cell of every episode
    pub start: Cell,
    /// Goal cell; transitioning out of it ends the episode
    pub goal: Cell,
    /// Penalty cell
    pub water: Cell,
    /// Reward for arriving at the goal
    pub goal_reward: f64,
    /// Reward for arriving in the water
    pub water_reward: f64,
    /// Step at which the episode is cut off
    pub step_limit: usize,
    /// Reward for being cut off
    pub timeout_reward: f64,
    /// Probability the move has no effect
    pub stay_probability: f64,
    /// Probability of veering in each rotational direction
    pub veer_probability: f64,
    /// Episodes per trial
    pub max_episodes: usize,
    /// Discount factor
    pub gamma: f64,
}

impl Default for GridworldConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            obstacles: vec![(2, 2), (2, 3)],
            start: (0, 0),
            goal: (4, 4),
            water: (2, 4),
            goal_reward: 10.0,
            water_reward: -10.0,
            step_limit: 100,
            timeout_reward: -100.0,
            stay_probability: 0.1,
            veer_probability: 0.05,
            max_episodes: 1000,
            gamma: 0.9,
        }
    }
}

/// Effective movement after noise is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Up,
    Right,
    Down,
    Left,
    Stay,
}

impl Move {
    const COMPASS: [Move; 4] = [Move::Up, Move::Right, Move::Down, Move::Left];

    fn from_action(action: Action) -> Result<Self> {
        Self::COMPASS
            .get(action)
            .copied()
            .ok_or_else(|| RLError::Environment(format!("invalid gridworld action {action}")))
    }

    /// Rotate by a quarter turn, clockwise when `clockwise` is set
    fn rotate(self, clockwise: bool) -> Self {
        let Some(i) = Self::COMPASS.iter().position(|&m| m == self) else {
            return self;
        };
        let j = if clockwise { (i + 1) % 4 } else { (i + 3) % 4 };
        Self::COMPASS[j]
    }
}

/// Gridworld environment
#[derive(Debug, Clone)]
pub struct Gridworld {
    config: GridworldConfig,
    /// State index for every cell in row-major order, `None` for obstacles
    index: Vec<Option<usize>>,
    num_states: usize,
    position: Cell,
    t: usize,
    terminal: bool,
}

impl Gridworld {
    /// Create a gridworld with the given layout
    pub fn new(config: GridworldConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(RLError::Config("gridworld must have at least one cell".into()));
        }
        let in_bounds = |(x, y): Cell| x < config.width && y < config.height;
        for cell in [config.start, config.goal, config.water] {
            if !in_bounds(cell) || config.obstacles.contains(&cell) {
                return Err(RLError::Config(format!(
                    "gridworld cell {cell:?} is outside the grid or blocked"
                )));
            }
        }
        let noise = config.stay_probability + 2.0 * config.veer_probability;
        if config.stay_probability < 0.0 || config.veer_probability < 0.0 || noise > 1.0 {
            return Err(RLError::Config(format!(
                "invalid gridworld noise: stay {} veer {}",
                config.stay_probability, config.veer_probability
            )));
        }
        if config.start == config.goal {
            return Err(RLError::Config(format!(
                "gridworld start {:?} must differ from the goal",
                config.start
            )));
        }
        if config.step_limit == 0 {
            return Err(RLError::Config("gridworld step_limit must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&config.gamma) {
            return Err(RLError::Config(format!(
                "gridworld gamma must lie in [0, 1], got {}",
                config.gamma
            )));
        }

        Ok(Self::with_layout(config))
    }

    /// Build without validating the layout
    fn with_layout(config: GridworldConfig) -> Self {
        let mut index = Vec::with_capacity(config.width * config.height);
        let mut next = 0;
        for y in 0..config.height {
            for x in 0..config.width {
                if config.obstacles.contains(&(x, y)) {
                    index.push(None);
                } else {
                    index.push(Some(next));
                    next += 1;
                }
            }
        }

        Self {
            position: config.start,
            config,
            index,
            num_states: next,
            t: 0,
            terminal: false,
        }
    }

    /// Layout in use
    #[must_use]
    pub fn config(&self) -> &GridworldConfig {
        &self.config
    }

    /// Current cell
    #[must_use]
    pub fn position(&self) -> Cell {
        self.position
    }

    /// Transitions taken this episode
    #[must_use]
    pub fn steps(&self) -> usize {
        self.t
    }

    /// Move the agent to an arbitrary open cell
    pub fn place(&mut self, cell: Cell) -> Result<()> {
        if self.cell_index(cell).is_none() {
            return Err(RLError::Environment(format!("cannot place agent at {cell:?}")));
        }
        self.position = cell;
        Ok(())
    }

    fn cell_index(&self, (x, y): Cell) -> Option<usize> {
        if x >= self.config.width || y >= self.config.height {
            return None;
        }
        self.index[y * self.config.width + x]
    }

    fn at_goal(&self) -> bool {
        self.position == self.config.goal
    }

    fn sample_move(&self, action: Action, rng: &RandomSource) -> Result<Move> {
        let intended = Move::from_action(action)?;
        let u = rng.float64();
        let stay = self.config.stay_probability;
        let veer = self.config.veer_probability;
        Ok(if u <= stay {
            Move::Stay
        } else if u <= stay + veer {
            intended.rotate(true)
        } else if u <= stay + 2.0 * veer {
            intended.rotate(false)
        } else {
            intended
        })
    }

    fn target(&self, m: Move) -> Option<Cell> {
        let (x, y) = self.position;
        match m {
            Move::Up => y.checked_sub(1).map(|y| (x, y)),
            Move::Right => Some((x + 1, y)),
            Move::Down => Some((x, y + 1)),
            Move::Left => x.checked_sub(1).map(|x| (x, y)),
            Move::Stay => Some((x, y)),
        }
    }
}

impl Default for Gridworld {
    fn default() -> Self {
        Self::with_layout(GridworldConfig::default())
    }
}

impl Environment for Gridworld {
    fn max_episodes(&self) -> usize {
        self.config.max_episodes
    }

    fn state_dim(&self) -> usize {
        self.num_states
    }

    fn num_actions(&self) -> usize {
        Move::COMPASS.len()
    }

    fn gamma(&self) -> f64 {
        self.config.gamma
    }

    fn transition(&mut self, action: Action, rng: &RandomSource) -> Result<f64> {
        self.t += 1;

        if self.at_goal() {
            self.terminal = true;
            return Ok(0.0);
        }

        if self.t >= self.config.step_limit {
            self.terminal = true;
            trace!(steps = self.t, "gridworld step limit reached");
            return Ok(self.config.timeout_reward);
        }

        let m = self.sample_move(action, rng)?;
        if let Some(cell) = self.target(m).filter(|&c| self.cell_index(c).is_some()) {
            self.position = cell;
        }

        Ok(if self.position == self.config.water {
            self.config.water_reward
        } else if self.at_goal() {
            self.config.goal_reward
        } else {
            0.0
        })
    }

    fn state(&self) -> Result<State> {
        if self.in_terminal_absorbing_state() {
            return Err(RLError::TerminalState);
        }
        let index = self.cell_index(self.position).ok_or_else(|| {
            RLError::Environment(format!("agent inside obstacle at {:?}", self.position))
        })?;
        State::one_hot(index, self.num_states)
    }

    fn in_terminal_absorbing_state(&self) -> bool {
        self.terminal || self.at_goal()
    }

    fn new_episode(&mut self, _rng: &RandomSource) {
        self.position = self.config.start;
        self.t = 0;
        self.terminal = false;
    }
}
