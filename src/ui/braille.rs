use std::collections::HashMap;

use ratatui::prelude::*;

/// Dots set per terminal cell for one colored layer.
pub type DotMap = HashMap<(usize, usize), u8>;

/// Character grid where each cell is either text or a 2x4 braille block.
pub struct BrailleGrid {
    grid: Vec<Vec<(char, Style)>>,
    width: usize,
    height: usize,
    bg: Color,
}

impl BrailleGrid {
    pub fn new(width: usize, height: usize, bg: Color) -> Self {
        Self {
            grid: vec![vec![(' ', Style::default().bg(bg)); width]; height],
            width,
            height,
            bg,
        }
    }

    /// Size in braille dots.
    pub fn dot_size(&self) -> (i32, i32) {
        ((self.width * 2) as i32, (self.height * 4) as i32)
    }

    fn braille_bit(sub_x: usize, sub_y: usize) -> u8 {
        match (sub_x, sub_y) {
            (0, 0) => 0x01,
            (0, 1) => 0x02,
            (0, 2) => 0x04,
            (0, 3) => 0x40,
            (1, 0) => 0x08,
            (1, 1) => 0x10,
            (1, 2) => 0x20,
            (1, 3) => 0x80,
            _ => 0,
        }
    }

    /// Bresenham line between two dot positions.
    pub fn line_dots(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
        let mut dots = Vec::new();
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut cx = x0;
        let mut cy = y0;
        loop {
            dots.push((cx, cy));
            if cx == x1 && cy == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; cx += sx; }
            if e2 <= dx { err += dx; cy += sy; }
        }
        dots
    }

    pub fn set_dot(&self, map: &mut DotMap, bx: i32, by: i32) {
        let (bw, bh) = self.dot_size();
        if bx < 0 || by < 0 || bx >= bw || by >= bh { return; }
        let cx = bx as usize / 2;
        let cy = by as usize / 4;
        let sx = bx as usize % 2;
        let sy = by as usize % 4;
        *map.entry((cx, cy)).or_insert(0) |= Self::braille_bit(sx, sy);
    }

    pub fn draw_line(&self, map: &mut DotMap, from: (i32, i32), to: (i32, i32)) {
        for (x, y) in Self::line_dots(from.0, from.1, to.0, to.1) {
            self.set_dot(map, x, y);
        }
    }

    /// Filled 2x2 dot block, the smallest visible "point".
    pub fn draw_point(&self, map: &mut DotMap, at: (i32, i32)) {
        for &(dx, dy) in &[(0, 0), (1, 0), (0, 1), (1, 1), (-1, 0), (0, -1)] {
            self.set_dot(map, at.0 + dx, at.1 + dy);
        }
    }

    /// Ring of dots around `at`.
    pub fn draw_ring(&self, map: &mut DotMap, at: (i32, i32), radius: f64) {
        let steps = 24;
        for i in 0..steps {
            let a = (i as f64 / steps as f64) * std::f64::consts::TAU;
            let x = at.0 as f64 + a.cos() * radius;
            let y = at.1 as f64 + a.sin() * radius;
            self.set_dot(map, x.round() as i32, y.round() as i32);
        }
    }

    /// Merge a dot layer onto the grid with a given color.
    pub fn write_layer(&mut self, map: &DotMap, color: Color, bold: bool) {
        for (&(cx, cy), &bits) in map {
            if cx < self.width && cy < self.height && bits != 0 {
                let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                let mut style = Style::default().fg(color).bg(self.bg);
                if bold { style = style.add_modifier(Modifier::BOLD); }
                let existing = self.grid[cy][cx].0 as u32;
                if (0x2800..0x2900).contains(&existing) {
                    let merged = (existing - 0x2800) as u8 | bits;
                    let merged_ch = char::from_u32(0x2800 + merged as u32).unwrap_or(ch);
                    self.grid[cy][cx] = (merged_ch, style);
                } else if self.grid[cy][cx].0 == ' ' {
                    self.grid[cy][cx] = (ch, style);
                }
            }
        }
    }

    /// Write text starting at a cell, clipped to the grid. Text wins over
    /// braille already in those cells.
    pub fn put_text(&mut self, cx: i32, cy: i32, text: &str, style: Style) {
        if cy < 0 || cy as usize >= self.height { return; }
        for (i, c) in text.chars().enumerate() {
            let x = cx + i as i32;
            if x < 0 { continue; }
            if x as usize >= self.width { break; }
            self.grid[cy as usize][x as usize] = (c, style.bg(self.bg));
        }
    }

    pub fn into_lines(self) -> Vec<Line<'static>> {
        self.grid
            .into_iter()
            .map(|row| {
                let spans: Vec<Span<'static>> = row
                    .into_iter()
                    .map(|(ch, style)| Span::styled(String::from(ch), style))
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}
