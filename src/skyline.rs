//! Edge list of the layer currently being filled.
//!
//! Looking down the y axis, the open face of a layer is a sequence of gaps
//! ordered along x. Each gap stores the x coordinate of its right edge
//! (`cum_x`) and how deep into z it has already been filled (`cum_z`). The
//! left edge of a gap is the previous gap's `cum_x` (or 0). Together the gaps
//! partition `[0, width)` without holes or overlaps.

/// One contiguous x-span of the open layer face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gap {
    pub cum_x: f64,
    pub cum_z: f64,
}

/// Which neighbours a gap has, with copies of their values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Neighbours {
    None,
    Right(Gap),
    Left(Gap),
    Both { left: Gap, right: Gap },
}

/// The gaps of one layer, left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct Skyline {
    gaps: Vec<Gap>,
}

impl Skyline {
    /// A single gap spanning the full width, nothing filled yet.
    pub fn new(width: f64) -> Self {
        Self {
            gaps: vec![Gap {
                cum_x: width,
                cum_z: 0.0,
            }],
        }
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn gap(&self, index: usize) -> Gap {
        self.gaps[index]
    }

    /// A flat skyline has a single gap and nothing left to even out.
    pub fn is_flat(&self) -> bool {
        self.gaps.len() == 1
    }

    /// Index of the shallowest gap; the leftmost one wins ties.
    pub fn lowest(&self) -> usize {
        let mut lowest = 0;
        for (idx, gap) in self.gaps.iter().enumerate().skip(1) {
            if gap.cum_z < self.gaps[lowest].cum_z {
                lowest = idx;
            }
        }
        lowest
    }

    pub fn neighbours(&self, index: usize) -> Neighbours {
        let left = index.checked_sub(1).map(|i| self.gaps[i]);
        let right = self.gaps.get(index + 1).copied();
        match (left, right) {
            (None, None) => Neighbours::None,
            (None, Some(right)) => Neighbours::Right(right),
            (Some(left), None) => Neighbours::Left(left),
            (Some(left), Some(right)) => Neighbours::Both { left, right },
        }
    }

    /// Width available at `index`: from the left neighbour's edge to its own.
    pub fn width_at(&self, index: usize) -> f64 {
        let start = index.checked_sub(1).map_or(0.0, |i| self.gaps[i].cum_x);
        self.gaps[index].cum_x - start
    }

    /// Gives up on the gap at `index` by raising it to a neighbour's depth.
    ///
    /// A gap with no left neighbour joins the right one; with no right
    /// neighbour it joins the left one. Between two neighbours of equal depth
    /// all three collapse into one; otherwise it joins the shallower side.
    /// Does nothing on a flat skyline.
    pub fn even_out(&mut self, index: usize) {
        let gap = self.gaps[index];
        match self.neighbours(index) {
            Neighbours::None => {}
            Neighbours::Right(_) => {
                self.gaps.remove(index);
            }
            Neighbours::Left(_) => {
                self.gaps[index - 1].cum_x = gap.cum_x;
                self.gaps.remove(index);
            }
            Neighbours::Both { left, right } if left.cum_z == right.cum_z => {
                self.gaps[index - 1].cum_x = right.cum_x;
                self.gaps.drain(index..=index + 1);
            }
            Neighbours::Both { left, right } => {
                if left.cum_z < right.cum_z {
                    self.gaps[index - 1].cum_x = gap.cum_x;
                }
                self.gaps.remove(index);
            }
        }
    }

    /// Records a box of `width` × `depth` placed into the gap at `index` and
    /// returns the x coordinate the box was placed at.
    ///
    /// The box sits against whichever side lets the skyline stay even: when
    /// its top meets a neighbour's depth the two spans merge, otherwise the
    /// gap is split. `span` is the full layer width; it decides the side when
    /// both neighbours are at the same depth.
    pub fn fill(&mut self, index: usize, width: f64, depth: f64, span: f64) -> f64 {
        let gap = self.gaps[index];
        let top = gap.cum_z + depth;

        match self.neighbours(index) {
            Neighbours::None => {
                if width == gap.cum_x {
                    self.gaps[index].cum_z = top;
                } else {
                    self.gaps[index] = Gap { cum_x: width, cum_z: top };
                    self.gaps.insert(index + 1, gap);
                }
                0.0
            }
            Neighbours::Right(right) => {
                if width == gap.cum_x {
                    if top == right.cum_z {
                        self.gaps.remove(index);
                    } else {
                        self.gaps[index].cum_z = top;
                    }
                    0.0
                } else {
                    let x = gap.cum_x - width;
                    self.gaps[index].cum_x = x;
                    if top != right.cum_z {
                        self.gaps.insert(index + 1, Gap { cum_x: gap.cum_x, cum_z: top });
                    }
                    x
                }
            }
            Neighbours::Left(left) => {
                if width == gap.cum_x - left.cum_x {
                    if top == left.cum_z {
                        self.gaps[index - 1].cum_x = gap.cum_x;
                        self.gaps.remove(index);
                    } else {
                        self.gaps[index].cum_z = top;
                    }
                } else if top == left.cum_z {
                    self.gaps[index - 1].cum_x = left.cum_x + width;
                } else {
                    self.gaps.insert(
                        index,
                        Gap {
                            cum_x: left.cum_x + width,
                            cum_z: top,
                        },
                    );
                }
                left.cum_x
            }
            Neighbours::Both { left, right } if left.cum_z == right.cum_z => {
                if width == gap.cum_x - left.cum_x {
                    if top == right.cum_z {
                        self.gaps[index - 1].cum_x = right.cum_x;
                        self.gaps.drain(index..=index + 1);
                    } else {
                        self.gaps[index].cum_z = top;
                    }
                    left.cum_x
                } else if left.cum_x < span - gap.cum_x {
                    if top == left.cum_z {
                        let x = gap.cum_x - width;
                        self.gaps[index].cum_x = x;
                        x
                    } else {
                        self.gaps.insert(
                            index,
                            Gap {
                                cum_x: left.cum_x + width,
                                cum_z: top,
                            },
                        );
                        left.cum_x
                    }
                } else if top == left.cum_z {
                    self.gaps[index - 1].cum_x = left.cum_x + width;
                    left.cum_x
                } else {
                    let x = gap.cum_x - width;
                    self.gaps[index].cum_x = x;
                    self.gaps.insert(index + 1, Gap { cum_x: gap.cum_x, cum_z: top });
                    x
                }
            }
            Neighbours::Both { left, right } => {
                if width == gap.cum_x - left.cum_x {
                    if top == left.cum_z {
                        self.gaps[index - 1].cum_x = gap.cum_x;
                        self.gaps.remove(index);
                    } else {
                        self.gaps[index].cum_z = top;
                    }
                    left.cum_x
                } else if top == left.cum_z {
                    self.gaps[index - 1].cum_x = left.cum_x + width;
                    left.cum_x
                } else if top == right.cum_z {
                    let x = gap.cum_x - width;
                    self.gaps[index].cum_x = x;
                    x
                } else {
                    self.gaps.insert(
                        index,
                        Gap {
                            cum_x: left.cum_x + width,
                            cum_z: top,
                        },
                    );
                    left.cum_x
                }
            }
        }
    }
}
