//! SPH smoothing kernels.
//!
//! Standard poly6 / spiky-gradient / viscosity-laplacian trio, all zero
//! outside their support radius and continuous at the boundary (the value at
//! `r = h` is exactly zero, so there is no force spike when a pair crosses
//! the cutoff). Normalization constants involve `h^-6` and `h^-9`; they are
//! evaluated in f64 once per parameter change because they blow up fast as
//! the support radius shrinks.
//!
//! The near-density variant is the same poly6/spiky pair on support `h/2`,
//! used as a purely repulsive short-range term against clustering.

use std::f64::consts::PI;

/// Precomputed kernel coefficients for one smoothing radius.
#[derive(Clone, Copy, Debug)]
pub struct KernelCoeffs {
    /// Support radius.
    pub h: f32,
    h_sq: f32,
    poly6_coeff: f32,
    spiky_grad_coeff: f32,
    visc_lap_coeff: f32,
    /// Near-field support (h/2).
    pub h_near: f32,
    near_poly6_coeff: f32,
    near_spiky_grad_coeff: f32,
}

impl KernelCoeffs {
    pub fn new(h: f32) -> Self {
        debug_assert!(h > 0.0 && h.is_finite());
        let hd = h as f64;
        let h_near = hd * 0.5;

        Self {
            h,
            h_sq: h * h,
            poly6_coeff: (315.0 / (64.0 * PI * hd.powi(9))) as f32,
            spiky_grad_coeff: (45.0 / (PI * hd.powi(6))) as f32,
            visc_lap_coeff: (45.0 / (PI * hd.powi(6))) as f32,
            h_near: h_near as f32,
            near_poly6_coeff: (315.0 / (64.0 * PI * h_near.powi(9))) as f32,
            near_spiky_grad_coeff: (45.0 / (PI * h_near.powi(6))) as f32,
        }
    }

    /// Poly6 density kernel: `315/(64 pi h^9) * (h^2 - r^2)^3` inside support.
    #[inline]
    pub fn poly6(&self, r: f32) -> f32 {
        if r >= self.h {
            return 0.0;
        }
        let t = self.h_sq - r * r;
        self.poly6_coeff * t * t * t
    }

    /// Poly6 on the near-field support `h/2`.
    #[inline]
    pub fn poly6_near(&self, r: f32) -> f32 {
        if r >= self.h_near {
            return 0.0;
        }
        let t = self.h_near * self.h_near - r * r;
        self.near_poly6_coeff * t * t * t
    }

    /// Magnitude of the spiky kernel gradient: `45/(pi h^6) * (h - r)^2`.
    ///
    /// The caller applies the direction; positive pressure times this along
    /// the j-to-i unit vector is repulsive.
    #[inline]
    pub fn spiky_grad(&self, r: f32) -> f32 {
        if r >= self.h {
            return 0.0;
        }
        let t = self.h - r;
        self.spiky_grad_coeff * t * t
    }

    /// Spiky gradient magnitude on the near-field support `h/2`.
    #[inline]
    pub fn spiky_grad_near(&self, r: f32) -> f32 {
        if r >= self.h_near {
            return 0.0;
        }
        let t = self.h_near - r;
        self.near_spiky_grad_coeff * t * t
    }

    /// Viscosity kernel laplacian: `45/(pi h^6) * (h - r)`.
    #[inline]
    pub fn viscosity_laplacian(&self, r: f32) -> f32 {
        if r >= self.h {
            return 0.0;
        }
        self.visc_lap_coeff * (self.h - r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 0.2;

    #[test]
    fn test_zero_at_and_beyond_support() {
        let k = KernelCoeffs::new(H);
        assert_eq!(k.poly6(H), 0.0);
        assert_eq!(k.poly6(H * 2.0), 0.0);
        assert_eq!(k.spiky_grad(H), 0.0);
        assert_eq!(k.viscosity_laplacian(H), 0.0);
        assert_eq!(k.poly6_near(H * 0.5), 0.0);
        assert_eq!(k.spiky_grad_near(H * 0.5), 0.0);
    }

    #[test]
    fn test_continuous_at_boundary() {
        // Approaching the support from inside, the kernels fall to zero
        // rather than dropping discontinuously.
        let k = KernelCoeffs::new(H);
        let just_inside = H * 0.999;
        assert!(k.poly6(just_inside) > 0.0);
        assert!(k.poly6(just_inside) < k.poly6(0.0) * 1e-4);
        assert!(k.spiky_grad(just_inside) > 0.0);
        assert!(k.spiky_grad(just_inside) < k.spiky_grad(0.0) * 1e-4);
        assert!(k.viscosity_laplacian(just_inside) < k.viscosity_laplacian(0.0) * 2e-3);
    }

    #[test]
    fn test_poly6_closed_form_at_zero() {
        // poly6(0) = 315/(64 pi h^9) * h^6 = 315/(64 pi h^3)
        let k = KernelCoeffs::new(H);
        let expected = 315.0 / (64.0 * std::f32::consts::PI * H.powi(3));
        let got = k.poly6(0.0);
        assert!(
            (got - expected).abs() / expected < 1e-4,
            "poly6(0) = {}, expected {}",
            got,
            expected
        );
    }

    #[test]
    fn test_spiky_closed_form_at_zero() {
        // spiky_grad(0) = 45/(pi h^6) * h^2 = 45/(pi h^4)
        let k = KernelCoeffs::new(H);
        let expected = 45.0 / (std::f32::consts::PI * H.powi(4));
        let got = k.spiky_grad(0.0);
        assert!(
            (got - expected).abs() / expected < 1e-4,
            "spiky_grad(0) = {}, expected {}",
            got,
            expected
        );
    }

    #[test]
    fn test_kernels_monotonic_decreasing() {
        let k = KernelCoeffs::new(H);
        let mut prev = f32::INFINITY;
        for step in 0..20 {
            let r = H * step as f32 / 20.0;
            let w = k.poly6(r);
            assert!(w <= prev, "poly6 not decreasing at r={}", r);
            prev = w;
        }
    }

    #[test]
    fn test_small_radius_coefficients_finite() {
        // h^-9 gets large quickly; the f64 evaluation must still land on a
        // finite f32.
        let k = KernelCoeffs::new(0.01);
        assert!(k.poly6(0.0).is_finite());
        assert!(k.spiky_grad(0.0).is_finite());
        assert!(k.poly6_near(0.0).is_finite());
    }
}
