//! Synthetic SPC file builder shared by the integration tests and benches.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

pub const FLAG_Y16:      u8 = 0x01;
pub const FLAG_MULTI:    u8 = 0x04;
pub const FLAG_XYXY:     u8 = 0x40;
pub const FLAG_X_VALUES: u8 = 0x80;

pub const FLOAT_EXP: i8 = -128;

/// Y payload of one subfile.
#[derive(Debug, Clone)]
pub enum YData {
    I32(Vec<i32>),
    I16(Vec<i16>),
    F32(Vec<f32>),
}

impl YData {
    pub fn len(&self) -> usize {
        match self {
            YData::I32(v) => v.len(),
            YData::I16(v) => v.len(),
            YData::F32(v) => v.len(),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            YData::I32(v) => v.iter().for_each(|y| out.write_i32::<LittleEndian>(*y).unwrap()),
            YData::I16(v) => v.iter().for_each(|y| out.write_i16::<LittleEndian>(*y).unwrap()),
            YData::F32(v) => v.iter().for_each(|y| out.write_f32::<LittleEndian>(*y).unwrap()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sub {
    pub exponent: i8,
    pub z_start:  f32,
    pub z_end:    f32,
    /// Only written for XYXY files.
    pub x:        Option<Vec<f32>>,
    pub y:        YData,
}

impl Sub {
    pub fn new(exponent: i8, y: YData) -> Self {
        Self { exponent, z_start: 0.0, z_end: 0.0, x: None, y }
    }

    pub fn with_x(mut self, x: Vec<f32>) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_z(mut self, z_start: f32, z_end: f32) -> Self {
        self.z_start = z_start;
        self.z_end = z_end;
        self
    }
}

/// Modern (0x4B) file builder.
#[derive(Debug, Clone)]
pub struct SpcBuilder {
    pub flags:      u8,
    pub exponent:   i8,
    pub num_points: u32,
    pub first_x:    f64,
    pub last_x:     f64,
    pub shared_x:   Option<Vec<f32>>,
    pub subs:       Vec<Sub>,
    pub log:        Option<Vec<u8>>,
    pub memo:       String,
}

impl SpcBuilder {
    pub fn new(flags: u8) -> Self {
        Self {
            flags,
            exponent: 0,
            num_points: 0,
            first_x: 0.0,
            last_x: 0.0,
            shared_x: None,
            subs: Vec::new(),
            log: None,
            memo: String::new(),
        }
    }

    pub fn exponent(mut self, e: i8) -> Self { self.exponent = e; self }
    pub fn points(mut self, n: u32) -> Self { self.num_points = n; self }
    pub fn range(mut self, first: f64, last: f64) -> Self { self.first_x = first; self.last_x = last; self }
    pub fn shared_x(mut self, x: Vec<f32>) -> Self { self.shared_x = Some(x); self }
    pub fn sub(mut self, s: Sub) -> Self { self.subs.push(s); self }
    pub fn log(mut self, text: &[u8]) -> Self { self.log = Some(text.to_vec()); self }
    pub fn memo(mut self, m: &str) -> Self { self.memo = m.to_owned(); self }

    pub fn build(&self) -> Vec<u8> {
        let multi = self.flags & FLAG_MULTI != 0;
        let mut out = vec![0u8; 512];
        out[0] = self.flags;
        out[1] = 0x4B;
        out[3] = self.exponent as u8;
        out[4..8].copy_from_slice(&self.num_points.to_le_bytes());
        out[8..16].copy_from_slice(&self.first_x.to_le_bytes());
        out[16..24].copy_from_slice(&self.last_x.to_le_bytes());
        out[24..28].copy_from_slice(&(self.subs.len() as u32).to_le_bytes());
        let memo = self.memo.as_bytes();
        out[88..88 + memo.len().min(130)].copy_from_slice(&memo[..memo.len().min(130)]);

        if let Some(x) = &self.shared_x {
            x.iter().for_each(|v| out.write_f32::<LittleEndian>(*v).unwrap());
        }
        for (i, s) in self.subs.iter().enumerate() {
            if multi {
                write_subheader(&mut out, s, i as u16);
            }
            if let Some(x) = &s.x {
                x.iter().for_each(|v| out.write_f32::<LittleEndian>(*v).unwrap());
            }
            s.y.write(&mut out);
        }

        if let Some(text) = &self.log {
            let offset = out.len() as u32;
            out[248..252].copy_from_slice(&offset.to_le_bytes());
            write_log(&mut out, text);
        }
        out
    }
}

pub fn write_subheader(out: &mut Vec<u8>, s: &Sub, index: u16) {
    out.write_u8(0).unwrap();
    out.write_i8(s.exponent).unwrap();
    out.write_u16::<LittleEndian>(index).unwrap();
    out.write_f32::<LittleEndian>(s.z_start).unwrap();
    out.write_f32::<LittleEndian>(s.z_end).unwrap();
    out.write_f32::<LittleEndian>(0.0).unwrap();
    let npts = s.x.as_ref().map_or(0, |x| x.len() as u32);
    out.write_u32::<LittleEndian>(npts).unwrap();
    out.write_u32::<LittleEndian>(1).unwrap();
    out.write_f32::<LittleEndian>(0.0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
}

pub fn write_log(out: &mut Vec<u8>, text: &[u8]) {
    let text_offset = 64u32;
    out.write_u32::<LittleEndian>(text_offset + text.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(text_offset).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.extend_from_slice(&[0u8; 44]);
    out.extend_from_slice(text);
}

/// Legacy (0x4D) single-spectrum file with swapped-half 32-bit words.
pub fn legacy_file(exponent: i16, first: f32, last: f32, ys: &[i32]) -> Vec<u8> {
    let mut out = vec![0u8; 256];
    out[1] = 0x4D;
    out[2..4].copy_from_slice(&exponent.to_le_bytes());
    out[4..8].copy_from_slice(&(ys.len() as f32).to_le_bytes());
    out[8..12].copy_from_slice(&first.to_le_bytes());
    out[12..16].copy_from_slice(&last.to_le_bytes());
    for y in ys {
        let b = y.to_le_bytes();
        out.extend_from_slice(&[b[2], b[3], b[0], b[1]]);
    }
    out
}

/// Legacy (0x4D) multi-spectrum file: subfile 0's subheader lives inside the
/// header at 224, later subfiles carry their own before their Y words.
pub fn legacy_multi_file(first: f32, last: f32, subs: &[Sub]) -> Vec<u8> {
    let points = subs.first().map_or(0, |s| s.y.len());
    let mut out = vec![0u8; 256];
    out[0] = FLAG_MULTI;
    out[1] = 0x4D;
    out[4..8].copy_from_slice(&(points as f32).to_le_bytes());
    out[8..12].copy_from_slice(&first.to_le_bytes());
    out[12..16].copy_from_slice(&last.to_le_bytes());
    for (i, s) in subs.iter().enumerate() {
        if i == 0 {
            let mut embedded = Vec::new();
            write_subheader(&mut embedded, s, 0);
            out[224..256].copy_from_slice(&embedded);
        } else {
            write_subheader(&mut out, s, i as u16);
        }
        match &s.y {
            YData::I32(v) => v.iter().for_each(|y| {
                let b = y.to_le_bytes();
                out.extend_from_slice(&[b[2], b[3], b[0], b[1]]);
            }),
            other => other.write(&mut out),
        }
    }
    out
}

/// Scenario A: Y-only, single, 32-bit, 5 points over 0..4.
pub fn scenario_a(exponent: i8, ys: [i32; 5]) -> Vec<u8> {
    SpcBuilder::new(0)
        .exponent(exponent)
        .points(5)
        .range(0.0, 4.0)
        .sub(Sub::new(exponent, YData::I32(ys.to_vec())))
        .build()
}
