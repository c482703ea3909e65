/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use uci_parser::UciOption;

/// One tunable integer with its legal range.
#[derive(Clone, Copy, Debug)]
pub struct Param {
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

impl Param {
    const fn new(value: i32, min: i32, max: i32) -> Self {
        Self { value, min, max }
    }
}

/// The search parameters exposed for tuning, in declaration order.
///
/// `LMR_Base` and `LMR_Div` are fixed-point, scaled by 100.
const DEFAULTS: [(&str, Param); 6] = [
    ("LMR_Base", Param::new(25, 0, 100)),
    ("LMR_Div", Param::new(195, 100, 400)),
    ("RFP_Margin", Param::new(75, 40, 200)),
    ("RFP_Depth", Param::new(7, 1, 10)),
    ("AspirationDelta", Param::new(20, 5, 100)),
    ("Move Overhead", Param::new(10, 0, 5000)),
];

/// A name -> integer registry of tunable parameters.
///
/// Read-mostly: `setoption` writes happen only between searches, and every
/// search snapshots the values it needs when it starts.
#[derive(Clone, Debug)]
pub struct Tunables(Vec<(&'static str, Param)>);

impl Tunables {
    pub fn new() -> Self {
        Self(DEFAULTS.to_vec())
    }

    /// Fetches the current value of `name`, or `None` for unknown parameters.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, p)| p.value)
    }

    /// Sets `name` to `value`, clamped into the parameter's legal range.
    ///
    /// Returns `false` for unknown parameters.
    pub fn set(&mut self, name: &str, value: i32) -> bool {
        if let Some((_, param)) = self
            .0
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            param.value = value.clamp(param.min, param.max);
            true
        } else {
            false
        }
    }

    /// UCI spin options for every parameter, printed in response to `uci`.
    pub fn uci_options(&self) -> impl Iterator<Item = UciOption> + '_ {
        self.0
            .iter()
            .map(|(name, p)| UciOption::spin(*name, p.value, p.min, p.max))
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self::new()
    }
}
