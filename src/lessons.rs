use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::blocks::BlockKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Motion,
    Costumes,
    Coordinates,
    Project,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    SpeedRunner,
    MapMaster,
    StyleStar,
    MathGenius,
    SuperCreator,
    GrandChampion,
}

impl Badge {
    pub fn label(self) -> &'static str {
        match self {
            Badge::SpeedRunner => "Speed Runner",
            Badge::MapMaster => "Map Master",
            Badge::StyleStar => "Style Star",
            Badge::MathGenius => "Math Genius",
            Badge::SuperCreator => "Super Creator",
            Badge::GrandChampion => "Grand Champion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Quiz {
    pub fn check(&self, answer: usize) -> bool {
        answer == self.correct_index
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub kind: LessonKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub target: Option<Vec2>,
    #[serde(default)]
    pub solution: Vec<BlockKind>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

impl Lesson {
    pub fn is_quiz(&self) -> bool {
        self.kind == LessonKind::Quiz
    }

    /// Stars granted the first time the lesson is completed.
    pub fn reward(&self) -> u32 {
        if self.is_quiz() {
            2
        } else {
            1
        }
    }

    pub fn badge(&self, is_last: bool) -> Badge {
        if is_last {
            return Badge::GrandChampion;
        }
        match self.kind {
            LessonKind::Quiz => Badge::MathGenius,
            LessonKind::Motion => Badge::SpeedRunner,
            LessonKind::Coordinates => Badge::MapMaster,
            LessonKind::Costumes => Badge::StyleStar,
            LessonKind::Project => Badge::SuperCreator,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonCatalog {
    lessons: Vec<Lesson>,
}

impl Default for LessonCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LessonCatalog {
    pub fn new(lessons: Vec<Lesson>) -> Result<Self> {
        if lessons.is_empty() {
            bail!("Lesson catalog must contain at least one lesson");
        }
        for (idx, lesson) in lessons.iter().enumerate() {
            if lessons[..idx].iter().any(|other| other.id == lesson.id) {
                bail!("Duplicate lesson id '{}'", lesson.id);
            }
            if let Some(quiz) = &lesson.quiz {
                if quiz.correct_index >= quiz.options.len() {
                    bail!("Lesson '{}' quiz answer index {} is out of range", lesson.id, quiz.correct_index);
                }
            }
        }
        Ok(Self { lessons })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read lesson catalog {}", path.display()))?;
        let lessons: Vec<Lesson> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse lesson catalog {}", path.display()))?;
        Self::new(lessons).with_context(|| format!("Invalid lesson catalog {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Lesson> {
        self.lessons.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.lessons.iter().position(|lesson| lesson.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.lessons.len()
    }

    pub fn builtin() -> Self {
        let lessons = vec![
            mission(
                "l1-coding",
                "Mission: The First Step",
                LessonKind::Motion,
                "Help the hero move!",
                "Use the Walk block to move 120 steps to the right and reach the treasure!",
                Vec2::new(120.0, 0.0),
                vec![BlockKind::move_steps(120.0)],
            ),
            riddle(
                "l2-math",
                "Math Riddle: Apple Counting",
                "Simple addition for Grade 1!",
                "If Sparky the Dog has 5 red apples and 3 green apples, how many apples does he have in total?",
                "5 apples + 3 apples = ?",
                &["7 apples", "8 apples", "9 apples", "10 apples"],
                1,
            ),
            mission(
                "l3-coding",
                "Mission: Space Jump",
                LessonKind::Coordinates,
                "Teleport through space!",
                "The Moon Base is at X: -100 and Y: 100. Use the Jump To block to get there instantly!",
                Vec2::new(-100.0, 100.0),
                vec![BlockKind::go_to(-100.0, 100.0)],
            ),
            riddle(
                "l4-math",
                "Math Riddle: Shape Mystery",
                "Simple geometry for Grade 2!",
                "Which of these shapes has exactly 3 sides and 3 corners?",
                "Which shape has 3 sides?",
                &["Square", "Circle", "Triangle", "Rectangle"],
                2,
            ),
            mission(
                "l5-coding",
                "Mission: Magic Costume",
                LessonKind::Costumes,
                "Change your persona!",
                "Change your persona to look like a hero, then jump to the treasure at (0, -80)!",
                Vec2::new(0.0, -80.0),
                vec![BlockKind::NextCostume, BlockKind::go_to(0.0, -80.0)],
            ),
            riddle(
                "l6-math",
                "Math Riddle: Toy Sharing",
                "Basic multiplication for Grade 3!",
                "If 4 friends each have 5 stickers, how many stickers do they have altogether?",
                "4 groups of 5 stickers = ?",
                &["9 stickers", "15 stickers", "20 stickers", "25 stickers"],
                2,
            ),
            mission(
                "l7-coding",
                "Mission: Gliding Goal",
                LessonKind::Motion,
                "Smooth movement!",
                "Use the Glide To block to slide smoothly to X: 150 and Y: 50. It's like skating!",
                Vec2::new(150.0, 50.0),
                vec![BlockKind::glide_to(150.0, 50.0)],
            ),
            riddle(
                "l8-math",
                "Math Riddle: Fraction Pizza",
                "Intro to fractions for Grade 4!",
                "If a pizza is cut into 4 equal slices and you eat 1 slice, what fraction of the pizza is left?",
                "You eat 1 out of 4 slices. How much is left?",
                &["1/4", "1/2", "3/4", "All of it"],
                2,
            ),
            mission(
                "l9-coding",
                "Mission: Spin & Slide",
                LessonKind::Project,
                "Combine your skills!",
                "Do a happy spin (360 degrees) and then glide to the secret treasure at (-50, -150)!",
                Vec2::new(-50.0, -150.0),
                vec![BlockKind::turn(360.0), BlockKind::glide_to(-50.0, -150.0)],
            ),
            riddle(
                "l10-math",
                "Math Riddle: Time Traveler",
                "Telling time for Grade 5!",
                "If a movie starts at 2:00 PM and lasts for 1 hour and 30 minutes, what time does it finish?",
                "2:00 PM + 1 hour 30 mins = ?",
                &["3:00 PM", "3:30 PM", "4:00 PM", "2:30 PM"],
                1,
            ),
            mission(
                "l11-coding",
                "Grand Final: Coding Boss",
                LessonKind::Project,
                "The Ultimate Coding Challenge!",
                "Change the world, pick a new persona, spin twice (720 deg), and reach the final treasure!",
                Vec2::new(200.0, 140.0),
                vec![
                    BlockKind::RandomBackground,
                    BlockKind::NextCostume,
                    BlockKind::Turn { degrees: 720.0 },
                    BlockKind::go_to(200.0, 140.0),
                ],
            ),
            riddle(
                "l12-math",
                "Grand Final: Math Master",
                "Area Master for Grade 6!",
                "A rectangular swimming pool is 10 meters long and 4 meters wide. What is the area of the pool floor?",
                "Area = Length x Width. 10m x 4m = ?",
                &["14 sq meters", "40 sq meters", "28 sq meters", "20 sq meters"],
                1,
            ),
        ];
        Self { lessons }
    }
}

fn mission(
    id: &str,
    title: &str,
    kind: LessonKind,
    description: &str,
    content: &str,
    target: Vec2,
    solution: Vec<BlockKind>,
) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: title.to_string(),
        kind,
        description: description.to_string(),
        content: content.to_string(),
        target: Some(target),
        solution,
        quiz: None,
    }
}

fn riddle(
    id: &str,
    title: &str,
    description: &str,
    content: &str,
    question: &str,
    options: &[&str],
    correct_index: usize,
) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: title.to_string(),
        kind: LessonKind::Quiz,
        description: description.to_string(),
        content: content.to_string(),
        target: None,
        solution: Vec::new(),
        quiz: Some(Quiz {
            question: question.to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
            correct_index,
        }),
    }
}
