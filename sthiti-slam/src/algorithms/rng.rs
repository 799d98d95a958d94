//! Ziggurat Gaussian sampler over a 32-bit SHR3 generator.
//!
//! Marsaglia–Tsang ziggurat with 128 strips: almost every draw is one table
//! compare and one multiply, with the curved strip edges and the exponential
//! tail handled by rejection. The sequence is fully determined by the seed,
//! which matters for reproducible scan matching.

/// Ziggurat right edge of the base strip.
const R: f32 = 3.442_620;

/// Table setup constants (double precision, cast on store).
const DN0: f64 = 3.442_619_855_899;
const VN: f64 = 9.912_563_035_26217e-3;
const M1: f64 = 2_147_483_648.0;

/// Gaussian random number generator.
#[derive(Debug, Clone)]
pub struct ZigguratRng {
    seed: u32,
    kn: [u32; 128],
    wn: [f32; 128],
    fn_tab: [f32; 128],
}

impl ZigguratRng {
    /// Create a generator with an explicit seed.
    pub fn new(seed: u32) -> Self {
        let mut kn = [0u32; 128];
        let mut wn = [0f32; 128];
        let mut fn_tab = [0f32; 128];

        let mut dn = DN0;
        let mut tn = DN0;
        let q = VN / (-0.5 * dn * dn).exp();

        kn[0] = ((dn / q) * M1) as u32;
        kn[1] = 0;

        wn[0] = (q / M1) as f32;
        wn[127] = (dn / M1) as f32;

        fn_tab[0] = 1.0;
        fn_tab[127] = (-0.5 * dn * dn).exp() as f32;

        for i in (1..=126).rev() {
            dn = (-2.0 * (VN / dn + (-0.5 * dn * dn).exp()).ln()).sqrt();
            kn[i + 1] = ((dn / tn) * M1) as u32;
            tn = dn;
            fn_tab[i] = (-0.5 * dn * dn).exp() as f32;
            wn[i] = (dn / M1) as f32;
        }

        Self {
            seed,
            kn,
            wn,
            fn_tab,
        }
    }

    /// Create a generator seeded from the wall clock.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos().wrapping_add(d.as_secs() as u32))
            .unwrap_or(0x9E37_79B9);
        Self::new(nanos)
    }

    /// SHR3 step: xorshift the seed, return old + new (wrapping).
    #[inline]
    fn shr3(&mut self) -> u32 {
        let prev = self.seed;
        let mut s = self.seed;
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        self.seed = s;
        prev.wrapping_add(s)
    }

    /// Uniform draw in (0, 1].
    #[inline]
    fn uni(&mut self) -> f32 {
        0.5 + (self.shr3() as i32 as f32) * 2.328_306e-10
    }

    /// One standard-normal draw.
    pub fn normal(&mut self) -> f32 {
        let hz = self.shr3() as i32;
        let iz = (hz & 127) as usize;
        if hz.unsigned_abs() < self.kn[iz] {
            hz as f32 * self.wn[iz]
        } else {
            self.normal_fix(hz, iz)
        }
    }

    /// A draw from `N(mean, sigma)`.
    #[inline]
    pub fn gaussian(&mut self, mean: f32, sigma: f32) -> f32 {
        mean + sigma * self.normal()
    }

    /// Rejection path: strip 0 samples the exponential tail, the other
    /// strips test against the density between table edges.
    fn normal_fix(&mut self, mut hz: i32, mut iz: usize) -> f32 {
        loop {
            let x = hz as f32 * self.wn[iz];

            if iz == 0 {
                loop {
                    let tail_x = -self.uni().ln() / R;
                    let tail_y = -self.uni().ln();
                    if tail_y + tail_y >= tail_x * tail_x {
                        return if hz > 0 { R + tail_x } else { -R - tail_x };
                    }
                }
            }

            let f0 = self.fn_tab[iz];
            let f1 = self.fn_tab[iz - 1];
            if f0 + self.uni() * (f1 - f0) < (-0.5 * x * x).exp() {
                return x;
            }

            hz = self.shr3() as i32;
            iz = (hz & 127) as usize;
            if hz.unsigned_abs() < self.kn[iz] {
                return hz as f32 * self.wn[iz];
            }
        }
    }
}
