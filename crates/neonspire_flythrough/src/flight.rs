use glam::Vec3;

#[derive(Debug, Clone)]
pub struct Flight {
    pub position: Vec3,
    pub yaw: f32,
    pub speed: f32,
}

impl Default for Flight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 60.0, 0.0),
            yaw: 30.0_f32.to_radians(),
            speed: 10.0,
        }
    }
}

impl Flight {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    pub fn advance(&mut self) -> Vec3 {
        self.position += self.forward() * self.speed;
        self.position
    }
}
