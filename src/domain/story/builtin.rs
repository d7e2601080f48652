//! 内置故事数据表
//!
//! 对应前端内置的晚安故事集：模块级常量，进程启动时构建为不可变目录。

/// 内置故事的原始记录
pub(super) struct BuiltinStory {
    pub slug: &'static str,
    pub title: &'static str,
    pub language: &'static str,
    pub paragraphs: &'static [&'static str],
}

pub(super) const BUILTIN_STORIES: &[BuiltinStory] = &[
    BuiltinStory {
        slug: "snow-white",
        title: "Snow White",
        language: "en",
        paragraphs: &[
            "Once upon a time, in a castle wrapped in winter quiet, there lived a gentle \
             princess called Snow White. Her hair was dark as ebony and her heart was soft \
             as falling snow.",
            "When the jealous queen sent her away, Snow White wandered deep into the forest, \
             where the trees whispered kindly and the fireflies lit a path to a tiny cottage.",
            "Inside lived seven little dwarfs, who welcomed her with warm soup and seven \
             small smiles. By day they dug for sparkling stones, and by night Snow White \
             sang them songs until their eyes grew heavy.",
            "One day the queen found her and offered a shining red apple. Snow White took a \
             single bite and fell into a deep, deep sleep, quiet as the snow outside.",
            "But a kind prince came riding by, and with a gentle kiss the spell was broken. \
             Snow White opened her eyes, the dwarfs cheered, and the whole forest seemed to \
             sigh with relief.",
            "And so they all lived happily, and every night the castle grew calm and dim, \
             just like your room right now. Goodnight, little one. Sleep softly, like Snow \
             White under her warm blanket of stars.",
        ],
    },
    BuiltinStory {
        slug: "goldilocks",
        title: "Goldilocks and the Three Bears",
        language: "en",
        paragraphs: &[
            "Once upon a time, three bears lived in a cozy house at the edge of the woods: \
             great big Papa Bear, middle-sized Mama Bear, and a very small Baby Bear.",
            "One morning their porridge was too hot, so they went for a slow walk while it \
             cooled. Just then, a curious girl named Goldilocks came wandering by and peeked \
             through the open door.",
            "She tasted the porridge: too hot, too cold, and then, just right. She tried the \
             chairs: too hard, too soft, and then, just right. She climbed the stairs and \
             tried the beds, and Baby Bear's little bed was so just-right that she fell fast \
             asleep.",
            "When the bears came home, they looked at their bowls and their chairs and their \
             beds, and there they found Goldilocks, snoring the tiniest snore.",
            "Goldilocks woke with a start, said she was very sorry, and the bears, who were \
             kind bears, walked her safely home through the woods.",
            "That night Baby Bear snuggled into his just-right bed, warm and heavy-eyed, \
             exactly like you. Goodnight, sleep tight, everything is just right.",
        ],
    },
    BuiltinStory {
        slug: "three-little-pigs",
        title: "The Three Little Pigs",
        language: "en",
        paragraphs: &[
            "Once upon a time, three little pigs set out to build their very own houses. The \
             first built a house of straw, quick as a sneeze. The second built a house of \
             sticks, quick as two sneezes.",
            "The third little pig took her time, laying brick upon brick, humming a patient \
             little song while the sun rolled slowly across the sky.",
            "Along came a wolf with big puffy cheeks. He huffed and he puffed and he blew \
             the straw house down. He huffed and he puffed and he blew the stick house down. \
             The two little pigs ran squealing to their sister's brick house.",
            "The wolf huffed and puffed and puffed and huffed, but the brick house stood \
             still and solid, warm light glowing in its windows. Tired out, the wolf gave a \
             last tiny puff, like a birthday candle breath, and padded away into the night.",
            "Inside, the three little pigs drank warm cocoa by the fire, safe and snug, and \
             decided they would all live together in the strong little house.",
            "And when the fire burned low, they curled up side by side and fell asleep to \
             the sound of the wind, which could huff and puff all it liked. Goodnight, \
             little pig, safe in your sturdy bed.",
        ],
    },
    BuiltinStory {
        slug: "tortoise-and-hare",
        title: "The Tortoise and the Hare",
        language: "en",
        paragraphs: &[
            "Once upon a time, a speedy hare laughed at a slow old tortoise. \"You are the \
             slowest fellow in the meadow,\" he teased. The tortoise only smiled and said, \
             \"Then let us race to the big oak tree.\"",
            "The race began, and the hare zoomed off in a cloud of dust, so far ahead that \
             he decided to rest in the soft clover. The afternoon sun was warm, the breeze \
             was gentle, and soon the hare was dreaming speedy little dreams.",
            "Step by step, breath by breath, the tortoise walked on. He did not hurry. He \
             did not stop. He just kept going, steady as a clock ticking toward bedtime.",
            "When the hare woke, the sky was orange and the tortoise was one small step \
             from the oak tree. The hare ran faster than he had ever run, but it was too \
             late: the tortoise touched the tree, slow and sure, and won.",
            "\"Well raced,\" yawned the hare, and the two friends sat under the oak \
             watching the first stars come out, one by one, unhurried.",
            "Slow and steady wins the race, and slow and steady breathing brings the very \
             best sleep. Breathe in, breathe out. Goodnight, steady little tortoise.",
        ],
    },
    BuiltinStory {
        slug: "red-riding-hood",
        title: "Little Red Riding Hood",
        language: "en",
        paragraphs: &[
            "Once upon a time there was a little girl who always wore a red hood, so \
             everyone called her Little Red Riding Hood. One evening she set off to bring \
             her grandmother a basket of bread and honey.",
            "The forest path was full of soft sounds: owls hooting their sleepy hellos, \
             leaves brushing together like whispers. A sly wolf asked where she was going, \
             and off he trotted ahead of her, up to grandmother's cottage.",
            "When Little Red Riding Hood arrived, something seemed odd. \"Grandmother, what \
             big ears you have!\" she said. \"What big eyes you have! What big teeth you \
             have!\"",
            "But a woodcutter passing by heard the commotion, opened the door, and shooed \
             the wolf out the window and far away into the hills, where he found it much \
             easier to bother no one at all.",
            "Grandmother and Little Red Riding Hood shared the bread and honey with the \
             woodcutter, and the cottage filled with warm lamplight and quiet laughter.",
            "Then grandmother tucked Little Red Riding Hood into the big soft bed, pulled \
             the quilt up to her chin, and hummed until her eyes closed. Goodnight, little \
             one in the red hood. The forest is quiet now.",
        ],
    },
];
