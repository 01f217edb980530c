//! Weather and day/night cycle

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::random::SimRng;

/// Fraction of a day that passes per simulated second (~50 s per day)
const DAY_NIGHT_SPEED: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Storm,
}

impl Weather {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Rain => "rain",
            Weather::Storm => "storm",
        }
    }

    pub fn is_wet(&self) -> bool {
        matches!(self, Weather::Rain | Weather::Storm)
    }
}

/// Environment tags visible to agents
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Environment {
    pub weather: Weather,
    /// 0.0 = midnight, 0.5 = noon
    pub time_of_day: f32,
}

/// Day/night clock plus a weather state machine
#[derive(Debug, Clone)]
pub struct Climate {
    pub time_of_day: f32,
    pub weather: Weather,
    weather_timer: f32,
    weather_duration: f32,
}

impl Climate {
    pub fn new(rng: &mut SimRng) -> Self {
        Self {
            time_of_day: 0.0,
            weather: Weather::Clear,
            weather_timer: 0.0,
            weather_duration: rng.gen_range(10.0..30.0),
        }
    }

    /// Climate that never changes on its own (scenarios and tests)
    pub fn fixed(weather: Weather, time_of_day: f32) -> Self {
        Self {
            time_of_day,
            weather,
            weather_timer: 0.0,
            weather_duration: f32::INFINITY,
        }
    }

    pub fn update(&mut self, dt: f32, rng: &mut SimRng) {
        self.time_of_day += dt * DAY_NIGHT_SPEED;
        if self.time_of_day >= 1.0 {
            self.time_of_day -= 1.0;
        }

        self.weather_timer += dt;
        if self.weather_timer >= self.weather_duration {
            self.weather_timer = 0.0;

            let chance: f32 = rng.gen();
            self.weather = match self.weather {
                Weather::Clear if chance < 0.3 => Weather::Rain,
                Weather::Clear if chance < 0.4 => Weather::Storm,
                Weather::Clear => Weather::Clear,
                _ if chance < 0.6 => Weather::Clear,
                current => current,
            };

            self.weather_duration = rng.gen_range(10.0..30.0);
            tracing::debug!(weather = self.weather.as_str(), "weather changed");
        }
    }

    pub fn environment(&self) -> Environment {
        Environment {
            weather: self.weather,
            time_of_day: self.time_of_day,
        }
    }
}
